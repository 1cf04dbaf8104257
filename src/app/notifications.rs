use serde::de::IgnoredAny;
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{error, warn};

use crate::app::session::SessionService;
use crate::domain::notification::Notification;
use crate::infra::api::{ApiClient, ApiError};

const NOTIFICATIONS_PATH: &str = "/api/notifications";
const UNREAD_COUNT_PATH: &str = "/api/notifications/unread-count";
const READ_ALL_PATH: &str = "/api/notifications/read-all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PanelState {
    pub notifications: Vec<Notification>,
    pub unread_count: u64,
}

#[derive(Deserialize)]
struct UnreadCount {
    count: u64,
}

/// Badge text for the bell icon; nothing when there is nothing unread.
pub fn badge_label(unread_count: u64) -> Option<String> {
    match unread_count {
        0 => None,
        1..=9 => Some(unread_count.to_string()),
        _ => Some("9+".to_string()),
    }
}

/// "Just now", "5m ago", "3h ago", "2d ago", then the calendar date once a
/// notification is older than a week.
pub fn relative_time(created_at: OffsetDateTime, now: OffsetDateTime) -> String {
    let elapsed = now - created_at;
    let days = elapsed.whole_days();
    let hours = elapsed.whole_hours();
    let minutes = elapsed.whole_minutes();

    if days > 7 {
        created_at.date().to_string()
    } else if days > 0 {
        format!("{}d ago", days)
    } else if hours > 0 {
        format!("{}h ago", hours)
    } else if minutes > 0 {
        format!("{}m ago", minutes)
    } else {
        "Just now".to_string()
    }
}

/// Inbox state behind the bell icon. Mutations hit the backend first and are
/// applied locally once it reports success.
#[derive(Clone)]
pub struct NotificationPanel {
    api: ApiClient,
    session: SessionService,
    state: Arc<watch::Sender<PanelState>>,
}

impl NotificationPanel {
    pub fn new(api: ApiClient, session: SessionService) -> Self {
        let (state, _) = watch::channel(PanelState::default());
        Self {
            api,
            session,
            state: Arc::new(state),
        }
    }

    pub fn snapshot(&self) -> PanelState {
        self.state.borrow().clone()
    }

    pub fn unread_count(&self) -> u64 {
        self.state.borrow().unread_count
    }

    pub fn badge(&self) -> Option<String> {
        badge_label(self.unread_count())
    }

    pub fn subscribe(&self) -> watch::Receiver<PanelState> {
        self.state.subscribe()
    }

    /// Panel opened: reload the full list.
    pub async fn open(&self) {
        self.refresh().await;
    }

    pub async fn refresh(&self) {
        if !self.session.is_signed_in() {
            return;
        }
        match self.api.get::<Vec<Notification>>(NOTIFICATIONS_PATH).await {
            Ok(envelope) => {
                let notifications = envelope.data.unwrap_or_default();
                let unread_count = notifications.iter().filter(|n| !n.read).count() as u64;
                self.state.send_replace(PanelState {
                    notifications,
                    unread_count,
                });
            }
            Err(err) => {
                error!(error = ?err, "failed to fetch notifications");
            }
        }
    }

    pub async fn refresh_unread_count(&self) {
        if !self.session.is_signed_in() {
            return;
        }
        match self.api.get::<UnreadCount>(UNREAD_COUNT_PATH).await {
            Ok(envelope) => {
                let Some(count) = envelope.count.or(envelope.data.map(|data| data.count)) else {
                    warn!("unread count response carried no count");
                    return;
                };
                self.state.send_if_modified(|state| {
                    let changed = state.unread_count != count;
                    state.unread_count = count;
                    changed
                });
            }
            Err(err) => {
                error!(error = ?err, "failed to fetch unread count");
            }
        }
    }

    pub async fn mark_read(&self, notification_id: &str) -> Result<(), ApiError> {
        if !self.session.is_signed_in() {
            return Ok(());
        }
        let path = format!("{}/{}/read", NOTIFICATIONS_PATH, notification_id);
        self.api.patch::<IgnoredAny>(&path).await.map_err(|err| {
            error!(error = ?err, notification_id, "failed to mark notification read");
            err
        })?;

        self.state.send_modify(|state| {
            let mut newly_read = false;
            for notification in state
                .notifications
                .iter_mut()
                .filter(|n| n.id == notification_id)
            {
                newly_read |= !notification.read;
                notification.read = true;
            }
            // The list may be stale; the server accepted the mark either way.
            if newly_read || !state.notifications.iter().any(|n| n.id == notification_id) {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        });
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), ApiError> {
        if !self.session.is_signed_in() {
            return Ok(());
        }
        self.api.patch::<IgnoredAny>(READ_ALL_PATH).await.map_err(|err| {
            error!(error = ?err, "failed to mark all notifications read");
            err
        })?;

        self.state.send_modify(|state| {
            for notification in &mut state.notifications {
                notification.read = true;
            }
            state.unread_count = 0;
        });
        Ok(())
    }

    pub async fn delete(&self, notification_id: &str) -> Result<(), ApiError> {
        if !self.session.is_signed_in() {
            return Ok(());
        }
        let path = format!("{}/{}", NOTIFICATIONS_PATH, notification_id);
        self.api.delete::<IgnoredAny>(&path).await.map_err(|err| {
            error!(error = ?err, notification_id, "failed to delete notification");
            err
        })?;

        self.state.send_modify(|state| {
            let was_unread = state
                .notifications
                .iter()
                .any(|n| n.id == notification_id && !n.read);
            if was_unread {
                state.unread_count = state.unread_count.saturating_sub(1);
            }
            state.notifications.retain(|n| n.id != notification_id);
        });
        Ok(())
    }

    /// Forget everything, e.g. after sign-out.
    pub fn clear(&self) {
        self.state.send_if_modified(|state| {
            let changed = *state != PanelState::default();
            *state = PanelState::default();
            changed
        });
    }
}
