use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::{error, info, warn};

use crate::app::content::SiteContent;
use crate::app::countdown::{days_remaining, Clock};
use crate::app::session::SessionService;
use crate::app::validation::{EnrollmentForm, FieldErrors, UploadLimits, ValidEnrollment};
use crate::domain::content::Course;
use crate::domain::enrollment::{Enrollment, EnrollmentState, EnrollmentStatus};
use crate::domain::user::User;
use crate::infra::api::{ApiClient, ApiError};

const MY_COURSES_PATH: &str = "/api/enrollments/my-courses";
const ENROLLMENTS_PATH: &str = "/api/enrollments";

/// What the enroll page shows for one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnrollmentView {
    SignInRequired,
    CourseNotFound {
        slug: String,
    },
    Form {
        course: Course,
        renewal: bool,
        previously_rejected: bool,
    },
    AlreadyEnrolled {
        course: Course,
        days_remaining: Option<i64>,
    },
    RenewalOffered {
        course: Course,
    },
    PendingReview {
        course: Course,
    },
}

impl EnrollmentView {
    pub fn accepts_submission(&self) -> bool {
        matches!(
            self,
            EnrollmentView::Form { .. } | EnrollmentView::RenewalOffered { .. }
        )
    }

    pub fn shows_form(&self) -> bool {
        matches!(self, EnrollmentView::Form { .. })
    }

    /// The user chose to renew: the renewal prompt becomes the form.
    pub fn accept_renewal(self) -> Self {
        match self {
            EnrollmentView::RenewalOffered { course } => EnrollmentView::Form {
                course,
                renewal: true,
                previously_rejected: false,
            },
            other => other,
        }
    }

    /// Line shown in place of the form, if any.
    pub fn notice(&self) -> Option<String> {
        match self {
            EnrollmentView::SignInRequired => Some("Please sign in to enroll".to_string()),
            EnrollmentView::CourseNotFound { .. } => Some("Course not found".to_string()),
            EnrollmentView::AlreadyEnrolled {
                course,
                days_remaining: Some(days),
            } => Some(format!(
                "You are already enrolled in {}. {} days remaining.",
                course.title, days
            )),
            EnrollmentView::AlreadyEnrolled { course, .. } => {
                Some(format!("You are already enrolled in {}.", course.title))
            }
            EnrollmentView::RenewalOffered { course } => Some(format!(
                "Your access to {} has expired. Renew to continue learning.",
                course.title
            )),
            EnrollmentView::PendingReview { course } => Some(format!(
                "Your enrollment in {} is pending review.",
                course.title
            )),
            EnrollmentView::Form {
                previously_rejected: true,
                ..
            } => Some(
                "Your previous enrollment was not approved. You can submit a new one."
                    .to_string(),
            ),
            EnrollmentView::Form { .. } => None,
        }
    }
}

/// The enrollment for `slug`. A record that still counts (pending or
/// approved) wins over a rejected one; backend order breaks ties.
pub fn find_enrollment<'a>(enrollments: &'a [Enrollment], slug: &str) -> Option<&'a Enrollment> {
    let mut matching = enrollments
        .iter()
        .filter(|enrollment| enrollment.course.slug == slug);
    let first = matching.next()?;
    if first.status != EnrollmentStatus::Rejected {
        return Some(first);
    }
    matching
        .find(|enrollment| enrollment.status != EnrollmentStatus::Rejected)
        .or(Some(first))
}

pub fn resolve_view(
    user: Option<&User>,
    slug: &str,
    course: Option<&Course>,
    enrollments: &[Enrollment],
    now: OffsetDateTime,
) -> EnrollmentView {
    if user.is_none() {
        return EnrollmentView::SignInRequired;
    }
    let Some(course) = course.cloned() else {
        return EnrollmentView::CourseNotFound {
            slug: slug.to_string(),
        };
    };

    let Some(enrollment) = find_enrollment(enrollments, slug) else {
        return EnrollmentView::Form {
            course,
            renewal: false,
            previously_rejected: false,
        };
    };

    match enrollment.state_at(now) {
        EnrollmentState::Active => EnrollmentView::AlreadyEnrolled {
            course,
            days_remaining: days_remaining(enrollment, now),
        },
        EnrollmentState::Expired => EnrollmentView::RenewalOffered { course },
        EnrollmentState::Pending => EnrollmentView::PendingReview { course },
        EnrollmentState::Rejected => EnrollmentView::Form {
            course,
            renewal: false,
            previously_rejected: true,
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("Please sign in to enroll")]
    NotSignedIn,
    #[error("Course {0} not found")]
    CourseNotFound(String),
    #[error("Please fix the errors in the form: {0}")]
    Invalid(FieldErrors),
    #[error("{0}")]
    Blocked(&'static str),
    #[error("enrollment submission failed: {0}")]
    Api(#[from] ApiError),
}

impl SubmitError {
    pub fn user_message(&self) -> String {
        match self {
            SubmitError::Invalid(_) => "Please fix the errors in the form".to_string(),
            SubmitError::Api(err) => err.user_message("Failed to submit enrollment"),
            other => other.to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmitError::Invalid(errors) => Some(errors),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub enrollment: Option<Enrollment>,
    pub message: Option<String>,
    pub renewal: bool,
}

#[derive(Clone)]
pub struct EnrollmentService {
    api: ApiClient,
    session: SessionService,
    content: Arc<SiteContent>,
    limits: UploadLimits,
    clock: Arc<dyn Clock>,
}

impl EnrollmentService {
    pub fn new(
        api: ApiClient,
        session: SessionService,
        content: Arc<SiteContent>,
        limits: UploadLimits,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            api,
            session,
            content,
            limits,
            clock,
        }
    }

    pub async fn my_courses(&self) -> Result<Vec<Enrollment>, ApiError> {
        let envelope = self.api.get::<Vec<Enrollment>>(MY_COURSES_PATH).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    pub async fn resolve(&self, slug: &str) -> EnrollmentView {
        let user = self.session.current_user();
        let course = self.content.course(slug);
        if user.is_none() || course.is_none() {
            return resolve_view(user.as_ref(), slug, course, &[], self.clock.now());
        }

        let enrollments = self.enrollments_or_empty(slug).await;
        resolve_view(user.as_ref(), slug, course, &enrollments, self.clock.now())
    }

    pub async fn submit(
        &self,
        slug: &str,
        form: &EnrollmentForm,
    ) -> Result<SubmissionReceipt, SubmitError> {
        if !self.session.is_signed_in() {
            return Err(SubmitError::NotSignedIn);
        }
        let course = self
            .content
            .course(slug)
            .cloned()
            .ok_or_else(|| SubmitError::CourseNotFound(slug.to_string()))?;
        let valid = form.validate(&self.limits).map_err(SubmitError::Invalid)?;

        let renewal = match self.resolve(slug).await {
            EnrollmentView::AlreadyEnrolled { .. } => {
                return Err(SubmitError::Blocked("You are already enrolled in this course"))
            }
            EnrollmentView::PendingReview { .. } => {
                return Err(SubmitError::Blocked("Your enrollment is pending review"))
            }
            EnrollmentView::SignInRequired => return Err(SubmitError::NotSignedIn),
            EnrollmentView::RenewalOffered { .. } => true,
            EnrollmentView::Form { renewal, .. } => renewal,
            EnrollmentView::CourseNotFound { slug } => {
                return Err(SubmitError::CourseNotFound(slug))
            }
        };

        let form = multipart_form(&course, &valid, renewal)?;
        let envelope = self
            .api
            .post_multipart::<Enrollment>(ENROLLMENTS_PATH, form)
            .await
            .map_err(|err| {
                error!(error = ?err, course_slug = %slug, "failed to submit enrollment");
                err
            })?;

        info!(course_slug = %slug, renewal, "enrollment submitted");
        Ok(SubmissionReceipt {
            enrollment: envelope.data,
            message: envelope.message,
            renewal,
        })
    }

    async fn enrollments_or_empty(&self, slug: &str) -> Vec<Enrollment> {
        match self.my_courses().await {
            Ok(enrollments) => enrollments,
            Err(err) => {
                warn!(error = ?err, course_slug = %slug, "failed to load enrollments");
                Vec::new()
            }
        }
    }
}

fn multipart_form(
    course: &Course,
    valid: &ValidEnrollment,
    renewal: bool,
) -> Result<Form, ApiError> {
    let screenshot = Part::bytes(valid.screenshot.data.to_vec())
        .file_name(valid.screenshot.file_name.clone())
        .mime_str(&valid.screenshot.content_type)
        .map_err(|err| ApiError::Request {
            path: ENROLLMENTS_PATH.to_string(),
            reason: err.to_string(),
        })?;

    let mut form = Form::new()
        .text("courseSlug", course.slug.clone())
        .text("courseTitle", course.title.clone())
        .text("fullName", valid.full_name.clone())
        .text("email", valid.email.clone())
        .text("paymentMethod", valid.payment_method.as_str())
        .text("isRenewal", renewal.to_string());
    if let Some(phone) = &valid.phone {
        form = form.text("phone", phone.clone());
    }
    if let Some(message) = &valid.message {
        form = form.text("message", message.clone());
    }
    Ok(form.part("screenshot", screenshot))
}
