use serde::de::IgnoredAny;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::validation::is_valid_email;
use crate::domain::user::{SignInRequest, SignUpRequest, User};
use crate::infra::api::{ApiClient, ApiError};

pub const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    /// True until the first session check completes.
    pub loading: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    SignUp,
    SignIn,
    SignOut,
}

impl SessionAction {
    pub fn fallback_message(&self) -> &'static str {
        match self {
            SessionAction::SignUp => "Sign up failed",
            SessionAction::SignIn => "Sign in failed",
            SessionAction::SignOut => "Sign out failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignUpError {
    #[error("Full name is required")]
    MissingName,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Password must be at least 6 characters")]
    PasswordTooShort,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Invalid(#[from] SignUpError),
    #[error("{}: {source}", .action.fallback_message())]
    Api {
        action: SessionAction,
        source: ApiError,
    },
}

impl SessionError {
    pub fn user_message(&self) -> String {
        match self {
            SessionError::Invalid(err) => err.to_string(),
            SessionError::Api { action, source } => {
                source.user_message(action.fallback_message())
            }
        }
    }
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), SignUpError> {
        if self.full_name.trim().is_empty() {
            return Err(SignUpError::MissingName);
        }
        if !is_valid_email(&self.email) {
            return Err(SignUpError::InvalidEmail);
        }
        if self.password != self.confirm_password {
            return Err(SignUpError::PasswordMismatch);
        }
        if self.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(SignUpError::PasswordTooShort);
        }
        Ok(())
    }
}

/// The signed-in user as mirrored from the backend session cookie. Clones
/// share one state; background tasks follow it through `subscribe`.
#[derive(Clone)]
pub struct SessionService {
    api: ApiClient,
    state: Arc<watch::Sender<SessionState>>,
}

impl SessionService {
    pub fn new(api: ApiClient) -> Self {
        let (state, _) = watch::channel(SessionState {
            user: None,
            loading: true,
        });
        Self {
            api,
            state: Arc::new(state),
        }
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state.borrow().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Mirrors `/api/auth/me`. Any failure leaves the session signed out.
    pub async fn check_auth(&self) -> Option<User> {
        let user = match self.api.get::<User>("/api/auth/me").await {
            Ok(envelope) => envelope.data,
            Err(ApiError::Rejected { status, .. }) => {
                info!(status = %status, "no active session");
                None
            }
            Err(err) => {
                warn!(error = ?err, "session check failed");
                None
            }
        };

        self.state.send_modify(|state| {
            state.user = user.clone();
            state.loading = false;
        });
        user
    }

    pub async fn sign_up(&self, request: &SignUpRequest) -> Result<User, SessionError> {
        request.validate()?;
        let user = self
            .authenticate("/api/auth/signup", request, SessionAction::SignUp)
            .await?;
        info!(user_id = %user.id, "account created");
        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let request = SignInRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let user = self
            .authenticate("/api/auth/signin", &request, SessionAction::SignIn)
            .await?;
        info!(user_id = %user.id, "signed in");
        Ok(user)
    }

    /// Clears the local user only once the backend confirms the logout.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.api
            .post_empty::<IgnoredAny>("/api/auth/logout")
            .await
            .map_err(|source| SessionError::Api {
                action: SessionAction::SignOut,
                source,
            })?;

        self.set_user(None);
        info!("signed out");
        Ok(())
    }

    async fn authenticate<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        action: SessionAction,
    ) -> Result<User, SessionError> {
        let envelope = self
            .api
            .post_json::<B, User>(path, body)
            .await
            .map_err(|source| SessionError::Api { action, source })?;

        let user = envelope.data.ok_or_else(|| SessionError::Api {
            action,
            source: ApiError::Decode {
                path: path.to_string(),
                reason: "response carried no user".to_string(),
            },
        })?;

        self.set_user(Some(user.clone()));
        Ok(user)
    }

    fn set_user(&self, user: Option<User>) {
        self.state.send_modify(|state| {
            state.user = user;
            state.loading = false;
        });
    }
}
