use tokio::sync::watch;
use tracing::debug;

use crate::app::notifications::NotificationPanel;
use crate::app::session::{SessionService, SessionState};
use crate::jobs::Job;

/// Keeps the bell badge current: a full reload when a user signs in, the
/// unread counter on every later tick, and a cleared panel after sign-out.
/// Session changes wake the poller straight away.
pub struct NotificationPoller {
    panel: NotificationPanel,
    session: SessionService,
    session_updates: watch::Receiver<SessionState>,
    seen_user: Option<String>,
}

impl NotificationPoller {
    pub fn new(panel: NotificationPanel, session: SessionService) -> Self {
        let session_updates = session.subscribe();
        Self {
            panel,
            session,
            session_updates,
            seen_user: None,
        }
    }
}

impl Job for NotificationPoller {
    fn name(&self) -> &'static str {
        "notification_poller"
    }

    async fn tick(&mut self) {
        match self.session.current_user() {
            None => {
                if self.seen_user.take().is_some() {
                    debug!("session ended, clearing notifications");
                    self.panel.clear();
                }
            }
            Some(user) if self.seen_user.as_deref() != Some(user.id.as_str()) => {
                debug!(user_id = %user.id, "loading notifications");
                self.seen_user = Some(user.id);
                self.panel.refresh().await;
            }
            Some(_) => self.panel.refresh_unread_count().await,
        }
    }

    async fn wake(&mut self) {
        loop {
            if self.session_updates.changed().await.is_err() {
                // Session service gone: nothing left to follow.
                std::future::pending::<()>().await;
            }
            let user_id = self
                .session_updates
                .borrow_and_update()
                .user
                .as_ref()
                .map(|user| user.id.clone());
            if user_id != self.seen_user {
                return;
            }
        }
    }
}
