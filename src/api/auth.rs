// Firebase Auth ID token verification
// RS256 against Google's published JWKS for securetoken.google.com

use anyhow::{anyhow, Result};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, error};

/// JWKS endpoint for Firebase Auth token signing keys
const JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// How long fetched signing keys are trusted (seconds)
const KEYS_TTL_SECS: u64 = 3600;

/// Verified signed-in principal, as issued by the identity provider
#[derive(Debug, Clone)]
pub struct Principal {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Claims we read off a Firebase ID token
#[derive(Debug, Deserialize)]
struct IdTokenClaims {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// Cached signing keys, keyed by kid
struct CachedKeys {
    keys: HashMap<String, DecodingKey>,
    expires_at: u64,
}

/// Verifies bearer ID tokens for one Firebase project
pub struct AuthVerifier {
    client: Client,
    project_id: String,
    key_cache: Arc<RwLock<Option<CachedKeys>>>,
}

impl AuthVerifier {
    pub fn new(client: Client, project_id: impl Into<String>) -> Self {
        Self {
            client,
            project_id: project_id.into(),
            key_cache: Arc::new(RwLock::new(None)),
        }
    }

    /// Verify an ID token and return the principal it identifies
    pub async fn verify(&self, token: &str) -> Result<Principal> {
        let header = jsonwebtoken::decode_header(token)?;
        let kid = header.kid.ok_or_else(|| anyhow!("Token has no kid"))?;

        let key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.project_id]);
        validation.set_issuer(&[format!(
            "https://securetoken.google.com/{}",
            self.project_id
        )]);

        let data = decode::<IdTokenClaims>(token, &key, &validation)?;

        Ok(Principal {
            uid: data.claims.sub,
            email: data.claims.email,
            display_name: data.claims.name,
            photo_url: data.claims.picture,
        })
    }

    /// Get a signing key by kid (with caching)
    async fn get_key(&self, kid: &str) -> Result<DecodingKey> {
        {
            let cache = self.key_cache.read().await;
            if let Some(cached) = cache.as_ref() {
                let now = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_default()
                    .as_secs();
                if cached.expires_at > now {
                    if let Some(key) = cached.keys.get(kid) {
                        return Ok(key.clone());
                    }
                    // Unknown kid: fall through and refresh, keys rotate
                }
            }
        }

        let keys = self.fetch_keys().await?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let key = keys.get(kid).cloned();
        {
            let mut cache = self.key_cache.write().await;
            *cache = Some(CachedKeys {
                keys,
                expires_at: now + KEYS_TTL_SECS,
            });
        }

        key.ok_or_else(|| anyhow!("Unknown signing key: {}", kid))
    }

    /// Fetch the current JWKS from Google
    async fn fetch_keys(&self) -> Result<HashMap<String, DecodingKey>> {
        let response = self.client.get(JWKS_URL).send().await?;

        if !response.status().is_success() {
            let body = response.text().await?;
            error!("Failed to fetch JWKS: {}", body);
            return Err(anyhow!("Failed to fetch JWKS"));
        }

        let jwks: Jwks = response.json().await?;
        let mut keys = HashMap::new();

        for jwk in jwks.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(err) => {
                    debug!("Skipping malformed JWK {}: {}", jwk.kid, err);
                }
            }
        }

        Ok(keys)
    }
}
