pub mod catalog;
pub mod contact;
pub mod content;
pub mod countdown;
pub mod courses;
pub mod enrollment;
pub mod notifications;
pub mod session;
pub mod validation;
