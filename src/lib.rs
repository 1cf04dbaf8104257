pub mod app;
pub mod config;
pub mod domain;
pub mod infra;
pub mod jobs;

use anyhow::{anyhow, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::app::catalog::CatalogService;
use crate::app::content::SiteContent;
use crate::app::countdown::{Clock, Countdowns, SystemClock};
use crate::app::enrollment::EnrollmentService;
use crate::app::notifications::NotificationPanel;
use crate::app::session::SessionService;
use crate::app::validation::UploadLimits;
use crate::config::AppConfig;
use crate::infra::api::ApiClient;
use crate::jobs::countdown_ticker::CountdownTicker;
use crate::jobs::ScheduledTask;

/// Everything a front end needs, wired once at startup. Cloning is cheap and
/// every clone shares the session, the cookie jar and the inbox.
#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
    pub session: SessionService,
    pub notifications: NotificationPanel,
    pub content: Arc<SiteContent>,
    pub clock: Arc<dyn Clock>,
    pub upload_limits: UploadLimits,
    pub contact_mailbox: String,
    pub notification_poll_interval: Duration,
    pub countdown_tick_interval: Duration,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &AppConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let api = ApiClient::new(config.api_url.clone(), config.http_timeout())
            .map_err(|err| anyhow!("failed to build HTTP client: {}", err))?;
        let content = Arc::new(SiteContent::embedded()?);
        let session = SessionService::new(api.clone());
        let notifications = NotificationPanel::new(api.clone(), session.clone());

        Ok(Self {
            api,
            session,
            notifications,
            content,
            clock,
            upload_limits: UploadLimits {
                screenshot_max_bytes: config.screenshot_max_bytes,
            },
            contact_mailbox: config.contact_mailbox.clone(),
            notification_poll_interval: config.notification_poll_interval(),
            countdown_tick_interval: config.countdown_tick_interval(),
        })
    }

    pub fn enrollments(&self) -> EnrollmentService {
        EnrollmentService::new(
            self.api.clone(),
            self.session.clone(),
            self.content.clone(),
            self.upload_limits,
            self.clock.clone(),
        )
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.api.clone())
    }

    /// Starts a countdown ticker over the signed-in user's courses; empty
    /// when nobody is signed in. Call again after the user changes.
    pub async fn start_countdowns(&self) -> (ScheduledTask, watch::Receiver<Countdowns>) {
        let enrollments = if self.session.is_signed_in() {
            self.enrollments().my_courses().await.unwrap_or_else(|err| {
                tracing::error!(error = ?err, "failed to fetch courses");
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let (ticker, countdowns) = CountdownTicker::new(enrollments, Arc::clone(&self.clock));
        (
            ScheduledTask::spawn(ticker, self.countdown_tick_interval),
            countdowns,
        )
    }
}
