use time::OffsetDateTime;

use crate::app::countdown::{format_remaining, renewal_due};
use crate::domain::enrollment::{Enrollment, EnrollmentState};

/// The My Courses page, one list per tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseTabs {
    pub purchased: Vec<Enrollment>,
    pub expired: Vec<Enrollment>,
    pub pending: Vec<Enrollment>,
    pub rejected: Vec<Enrollment>,
}

impl CourseTabs {
    pub fn partition(enrollments: Vec<Enrollment>, now: OffsetDateTime) -> Self {
        let mut tabs = CourseTabs::default();
        for enrollment in enrollments {
            match enrollment.state_at(now) {
                EnrollmentState::Active => tabs.purchased.push(enrollment),
                EnrollmentState::Expired => tabs.expired.push(enrollment),
                EnrollmentState::Pending => tabs.pending.push(enrollment),
                EnrollmentState::Rejected => tabs.rejected.push(enrollment),
            }
        }
        tabs
    }

    pub fn len(&self) -> usize {
        self.purchased.len() + self.expired.len() + self.pending.len() + self.rejected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Summary line for an active course card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveCourse {
    pub enrollment_id: String,
    pub title: String,
    pub time_remaining: Option<String>,
    pub renewal_due: bool,
}

pub fn active_courses(tabs: &CourseTabs, now: OffsetDateTime) -> Vec<ActiveCourse> {
    tabs.purchased
        .iter()
        .map(|enrollment| ActiveCourse {
            enrollment_id: enrollment.id.clone(),
            title: enrollment.course.title.clone(),
            time_remaining: enrollment
                .expiration_date
                .map(|expiration| format_remaining(expiration, now)),
            renewal_due: renewal_due(enrollment, now),
        })
        .collect()
}
