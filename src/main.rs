use anyhow::anyhow;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use binaryhub::app::countdown::Countdowns;
use binaryhub::app::courses::{active_courses, CourseTabs};
use binaryhub::app::notifications::badge_label;
use binaryhub::config::AppConfig;
use binaryhub::jobs::notification_poller::NotificationPoller;
use binaryhub::jobs::ScheduledTask;
use binaryhub::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let state = AppState::new(&config)?;

    if state.session.check_auth().await.is_none() {
        if let Some(credentials) = &config.credentials {
            if let Err(err) = state
                .session
                .sign_in(&credentials.email, &credentials.password)
                .await
            {
                tracing::warn!(error = %err, "{}", err.user_message());
            }
        }
    }

    match state.session.current_user() {
        Some(user) => tracing::info!(user_id = %user.id, email = %user.email, "session ready"),
        None => tracing::info!("browsing anonymously"),
    }

    match config.app_mode.as_str() {
        "watch" => watch_session(state).await,
        "courses" => {
            log_courses(&state).await;
            Ok(())
        }
        other => Err(anyhow!("unknown APP_MODE: {}", other)),
    }
}

async fn watch_session(state: AppState) -> anyhow::Result<()> {
    let poller = ScheduledTask::spawn(
        NotificationPoller::new(state.notifications.clone(), state.session.clone()),
        state.notification_poll_interval,
    );

    let mut countdown_owner = state.session.current_user().map(|user| user.id);
    let (mut ticker, mut countdowns) = state.start_countdowns().await;

    let mut inbox = state.notifications.subscribe();
    let mut session = state.session.subscribe();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            changed = inbox.changed() => {
                if changed.is_err() {
                    break;
                }
                let unread = inbox.borrow_and_update().unread_count;
                let badge = badge_label(unread).unwrap_or_default();
                tracing::info!(unread, badge = %badge, "notifications updated");
            }
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
                let user_id = session
                    .borrow_and_update()
                    .user
                    .as_ref()
                    .map(|user| user.id.clone());
                if user_id != countdown_owner {
                    tracing::info!(signed_in = user_id.is_some(), "session changed");
                    countdown_owner = user_id;
                    ticker.cancel().await;
                    (ticker, countdowns) = state.start_countdowns().await;
                }
            }
            changed = countdowns.changed() => {
                if changed.is_err() {
                    break;
                }
                log_countdowns(&mut countdowns);
            }
        }
    }

    poller.cancel().await;
    ticker.cancel().await;
    Ok(())
}

fn log_countdowns(countdowns: &mut watch::Receiver<Countdowns>) {
    for (enrollment_id, remaining) in countdowns.borrow_and_update().iter() {
        tracing::debug!(enrollment_id = %enrollment_id, remaining = %remaining, "countdown");
    }
}

async fn log_courses(state: &AppState) {
    if !state.session.is_signed_in() {
        tracing::warn!("sign in to see your courses");
        return;
    }

    let enrollments = match state.enrollments().my_courses().await {
        Ok(enrollments) => enrollments,
        Err(err) => {
            tracing::error!(error = ?err, "{}", err.user_message("Failed to fetch courses"));
            return;
        }
    };

    let now = state.clock.now();
    let tabs = CourseTabs::partition(enrollments, now);
    tracing::info!(
        purchased = tabs.purchased.len(),
        expired = tabs.expired.len(),
        pending = tabs.pending.len(),
        rejected = tabs.rejected.len(),
        "my courses"
    );
    for course in active_courses(&tabs, now) {
        tracing::info!(
            title = %course.title,
            remaining = course.time_remaining.as_deref().unwrap_or("Calculating..."),
            renewal_due = course.renewal_due,
            "active course"
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
