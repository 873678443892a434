use crate::domain::ports::TokenProvider;
use crate::utils::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::Mutex;

pub const FLEET_ENGINE_AUDIENCE: &str = "https://fleetengine.googleapis.com/";
pub const ROUTE_OPTIMIZATION_AUDIENCE: &str = "https://routeoptimization.googleapis.com/";

/// Tokens are renewed this long before they expire.
const REFRESH_MARGIN_SECONDS: i64 = 60;

/// A token obtained elsewhere (e.g. `gcloud auth print-access-token`).
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() || token.contains("${") {
            return Err(SyncError::AuthError {
                message: "bearer token is empty or an unresolved ${VAR} placeholder".to_string(),
            });
        }
        Ok(Self { token })
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn bearer_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
}

impl ServiceAccountKey {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        serde_json::from_str(&content).map_err(|e| SyncError::AuthError {
            message: format!(
                "invalid service account key '{}': {}",
                path.as_ref().display(),
                e
            ),
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

struct CachedToken {
    token: String,
    expires_at: DateTime<Utc>,
}

/// 以服務帳戶金鑰自簽 JWT（RS256），快取至到期前
pub struct ServiceAccountTokenMinter {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    audience: String,
    lifetime: ChronoDuration,
    cached: Mutex<Option<CachedToken>>,
}

impl ServiceAccountTokenMinter {
    pub fn new(key: ServiceAccountKey, audience: impl Into<String>, lifetime_seconds: i64) -> Result<Self> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())?;
        Ok(Self {
            key,
            encoding_key,
            audience: audience.into(),
            lifetime: ChronoDuration::seconds(lifetime_seconds),
            cached: Mutex::new(None),
        })
    }

    pub fn mint_at(&self, now: DateTime<Utc>) -> Result<(String, DateTime<Utc>)> {
        let expires_at = now + self.lifetime;
        let claims = ServerClaims {
            iss: self.key.client_email.clone(),
            sub: self.key.client_email.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();

        let token = encode(&header, &claims, &self.encoding_key)?;
        Ok((token, expires_at))
    }
}

#[async_trait]
impl TokenProvider for ServiceAccountTokenMinter {
    async fn bearer_token(&self) -> Result<String> {
        let now = Utc::now();
        let mut cached = self.cached.lock().await;

        if let Some(current) = cached.as_ref() {
            if current.expires_at - ChronoDuration::seconds(REFRESH_MARGIN_SECONDS) > now {
                return Ok(current.token.clone());
            }
        }

        let (token, expires_at) = self.mint_at(now)?;
        tracing::debug!("🔑 Minted token for {} (expires {})", self.audience, expires_at);
        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at,
        });
        Ok(token)
    }
}
