pub mod catalog;
pub mod content;
pub mod enrollment;
pub mod notification;
pub mod user;
