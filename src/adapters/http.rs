use crate::domain::ports::TokenProvider;
use crate::utils::error::{Result, SyncError};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    error: GoogleError,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Authorized JSON client for one REST service.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    service: &'static str,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    pub fn new(
        service: &'static str,
        base_url: &str,
        tokens: Arc<dyn TokenProvider>,
        request_timeout: Duration,
    ) -> Result<Self> {
        Url::parse(base_url).map_err(|e| SyncError::InvalidConfigValueError {
            field: format!("{} endpoint", service),
            value: base_url.to_string(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("route-fleet-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service,
            tokens,
        })
    }

    /// Joins `segments` onto the base URL, percent-encoding each one, so an id
    /// containing `/`, `#` or `?` stays a single path segment.
    pub fn url(&self, segments: &[&str]) -> Result<Url> {
        let invalid = |reason: String| SyncError::ConfigError {
            message: format!("Invalid {} URL '{}': {}", self.service, self.base_url, reason),
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("endpoint cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub async fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        let url = self.url(segments)?;
        let token = self.tokens.bearer_token().await?;
        tracing::debug!("📡 {} {} {}", self.service, method, url);
        Ok(self.client.request(method, url).bearer_auth(token))
    }

    pub async fn send_json<B, T>(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, &str)],
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.request(method, segments).await?;
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        tracing::debug!("📡 {} response status: {}", self.service, response.status());

        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(self.status_error(&segments.join("/"), response).await)
        }
    }

    async fn status_error(&self, resource: &str, response: Response) -> SyncError {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<GoogleErrorBody>(&text).ok();

        let (message, status_name) = match parsed {
            Some(body) => (body.error.message, body.error.status),
            None => (text, String::new()),
        };

        match status {
            StatusCode::CONFLICT => SyncError::AlreadyExistsError {
                resource: resource.to_string(),
            },
            _ if status_name == "ALREADY_EXISTS" => SyncError::AlreadyExistsError {
                resource: resource.to_string(),
            },
            StatusCode::NOT_FOUND => SyncError::NotFoundError {
                resource: resource.to_string(),
            },
            StatusCode::UNAUTHORIZED => SyncError::AuthError {
                message: format!("{} rejected the token: {}", self.service, message),
            },
            _ => SyncError::ApiStatusError {
                service: self.service.to_string(),
                status: status.as_u16(),
                message,
            },
        }
    }
}
