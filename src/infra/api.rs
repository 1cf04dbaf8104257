use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Every endpoint answers with `{ success, data?, message? }`. The auth
/// endpoints put the user under `user` and the unread counter may sit at the
/// top level as `count`.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default = "none", alias = "user")]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub count: Option<u64>,
}

fn none<T>() -> Option<T> {
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {path} failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{path} answered {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Rejected {
        path: String,
        status: StatusCode,
        message: Option<String>,
    },
    #[error("unexpected response from {path}: {reason}")]
    Decode { path: String, reason: String },
    #[error("cannot build request for {path}: {reason}")]
    Request { path: String, reason: String },
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Transport { source, .. } => source.status(),
            _ => None,
        }
    }

    pub fn server_message(&self) -> Option<&str> {
        match self {
            ApiError::Rejected { message, .. } => {
                message.as_deref().filter(|message| !message.is_empty())
            }
            _ => None,
        }
    }

    /// Text suitable for a toast: the server's own message when it sent one.
    pub fn user_message(&self, fallback: &str) -> String {
        self.server_message().unwrap_or(fallback).to_string()
    }
}

/// Cookie-carrying client for the Binary Hub REST API. Clones share the
/// connection pool and the session cookie.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.get(url)).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.get(url).query(query)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<Envelope<T>, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path)?;
        self.send(path, self.client.post(url).json(body)).await
    }

    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.post(url)).await
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.post(url).multipart(form)).await
    }

    pub async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.patch(url)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<Envelope<T>, ApiError> {
        let url = self.endpoint(path)?;
        self.send(path, self.client.delete(url)).await
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|err| ApiError::Request {
            path: path.to_string(),
            reason: err.to_string(),
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<Envelope<T>, ApiError> {
        let response = request.send().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|source| ApiError::Transport {
            path: path.to_string(),
            source,
        })?;

        let envelope = match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(ApiError::Rejected {
                    path: path.to_string(),
                    status,
                    message: error_message(&body),
                })
            }
            Err(err) => {
                return Err(ApiError::Decode {
                    path: path.to_string(),
                    reason: err.to_string(),
                })
            }
        };

        if !status.is_success() || !envelope.success {
            return Err(ApiError::Rejected {
                path: path.to_string(),
                status,
                message: envelope.message,
            });
        }

        Ok(envelope)
    }
}

/// Pulls `message` out of an error body whose `data` did not match the
/// expected shape.
fn error_message(body: &[u8]) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|body| body.message)
}
