use anyhow::{anyhow, Result};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_CONTACT_MAILBOX: &str = "consultancy@binaryhub.pk";
pub const DEFAULT_SCREENSHOT_MAX_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api_url: Url,
    pub app_mode: String,
    pub http_timeout_seconds: u64,
    pub notification_poll_seconds: u64,
    pub countdown_tick_millis: u64,
    pub screenshot_max_bytes: u64,
    pub contact_mailbox: String,
    pub credentials: Option<Credentials>,
}

/// Optional account the headless driver signs in with when no session
/// cookie is present.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let api_url = env_or("API_URL", DEFAULT_API_URL);
        let api_url =
            Url::parse(&api_url).map_err(|err| anyhow!("invalid API_URL: {}", err))?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(anyhow!("invalid API_URL: expected an http(s) URL"));
        }

        let notification_poll_seconds: u64 = env_or_parse("NOTIFICATION_POLL_SECONDS", "30")?;
        if notification_poll_seconds == 0 {
            return Err(anyhow!("invalid NOTIFICATION_POLL_SECONDS: must be positive"));
        }
        let countdown_tick_millis: u64 = env_or_parse("COUNTDOWN_TICK_MILLIS", "1000")?;
        if countdown_tick_millis == 0 {
            return Err(anyhow!("invalid COUNTDOWN_TICK_MILLIS: must be positive"));
        }

        let credentials = match (
            std::env::var("BINARYHUB_EMAIL").ok(),
            std::env::var("BINARYHUB_PASSWORD").ok(),
        ) {
            (Some(email), Some(password)) => Some(Credentials { email, password }),
            (None, None) => None,
            _ => {
                return Err(anyhow!(
                    "BINARYHUB_EMAIL and BINARYHUB_PASSWORD must be set together"
                ))
            }
        };

        Ok(Self {
            api_url,
            app_mode: env_or("APP_MODE", "watch"),
            http_timeout_seconds: env_or_parse("HTTP_TIMEOUT_SECONDS", "15")?,
            notification_poll_seconds,
            countdown_tick_millis,
            screenshot_max_bytes: env_or_parse(
                "SCREENSHOT_MAX_BYTES",
                &DEFAULT_SCREENSHOT_MAX_BYTES.to_string(),
            )?,
            contact_mailbox: env_or("CONTACT_MAILBOX", DEFAULT_CONTACT_MAILBOX),
            credentials,
        })
    }

    /// Defaults for every setting except the backend location.
    pub fn with_api_url(api_url: Url) -> Self {
        Self {
            api_url,
            app_mode: "watch".to_string(),
            http_timeout_seconds: 15,
            notification_poll_seconds: 30,
            countdown_tick_millis: 1000,
            screenshot_max_bytes: DEFAULT_SCREENSHOT_MAX_BYTES,
            contact_mailbox: DEFAULT_CONTACT_MAILBOX.to_string(),
            credentials: None,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn notification_poll_interval(&self) -> Duration {
        Duration::from_secs(self.notification_poll_seconds)
    }

    pub fn countdown_tick_interval(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_millis)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::fmt::Display,
{
    let value = std::env::var(key).unwrap_or_else(|_| default.to_string());
    value
        .parse::<T>()
        .map_err(|err| anyhow!("invalid {}: {}", key, err))
}
