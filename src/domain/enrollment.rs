use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRef {
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub course: CourseRef,
    pub status: EnrollmentStatus,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub purchase_date: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expiration_date: Option<OffsetDateTime>,
    /// Computed by the backend at read time.
    #[serde(default)]
    pub expired: bool,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
}

/// Where an enrollment sits in its lifecycle at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentState {
    Active,
    Expired,
    Pending,
    Rejected,
}

impl Enrollment {
    /// An approved enrollment counts as expired when the backend says so or
    /// when its expiration date has already passed.
    pub fn state_at(&self, now: OffsetDateTime) -> EnrollmentState {
        match self.status {
            EnrollmentStatus::Pending => EnrollmentState::Pending,
            EnrollmentStatus::Rejected => EnrollmentState::Rejected,
            EnrollmentStatus::Approved => {
                let lapsed = self.expiration_date.is_some_and(|date| date <= now);
                if self.expired || lapsed {
                    EnrollmentState::Expired
                } else {
                    EnrollmentState::Active
                }
            }
        }
    }
}
