use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub read: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub enrollment_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationKind {
    AdmissionAccepted,
    AdmissionRejected,
    Welcome,
    CourseRenewal,
    Other(String),
}

impl NotificationKind {
    pub fn as_str(&self) -> &str {
        match self {
            NotificationKind::AdmissionAccepted => "admission_accepted",
            NotificationKind::AdmissionRejected => "admission_rejected",
            NotificationKind::Welcome => "welcome",
            NotificationKind::CourseRenewal => "course_renewal",
            NotificationKind::Other(other) => other,
        }
    }
}

impl From<String> for NotificationKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admission_accepted" => NotificationKind::AdmissionAccepted,
            "admission_rejected" => NotificationKind::AdmissionRejected,
            "welcome" => NotificationKind::Welcome,
            "course_renewal" => NotificationKind::CourseRenewal,
            _ => NotificationKind::Other(value),
        }
    }
}

impl From<NotificationKind> for String {
    fn from(kind: NotificationKind) -> Self {
        kind.as_str().to_string()
    }
}
