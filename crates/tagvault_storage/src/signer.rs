//! HMAC signed retrieval URLs.
//!
//! A signed URL has the shape
//!
//! ```text
//! {base_url}/api/v1/blobs/{key}?expires={unix seconds}&signature={hex}
//! ```
//!
//! where the signature is HMAC-SHA256 over `"{key}:{expires}"` with the
//! configured secret. Anyone holding the URL can read the blob until it expires;
//! nothing else is needed.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tagvault_error::{StorageError, StorageErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// Path prefix under which signed blobs are served.
pub const BLOB_ROUTE_PREFIX: &str = "/api/v1/blobs";

/// Signs and verifies blob retrieval URLs.
#[derive(Clone)]
pub struct UrlSigner {
    base_url: String,
    secret: Vec<u8>,
}

impl std::fmt::Debug for UrlSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlSigner")
            .field("base_url", &self.base_url)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl UrlSigner {
    /// Create a signer issuing URLs under `base_url`.
    ///
    /// A trailing slash on `base_url` is ignored.
    pub fn new(base_url: impl Into<String>, secret: impl AsRef<[u8]>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            secret: secret.as_ref().to_vec(),
        }
    }

    fn mac(&self, key: &str, expires: i64) -> Result<HmacSha256, StorageError> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).map_err(|e| {
            StorageError::new(StorageErrorKind::Unavailable(format!(
                "url signing key rejected: {}",
                e
            )))
        })?;
        mac.update(format!("{}:{}", key, expires).as_bytes());
        Ok(mac)
    }

    /// Hex signature for `key` expiring at the unix time `expires`.
    pub fn signature(&self, key: &str, expires: i64) -> Result<String, StorageError> {
        let mac = self.mac(key, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Full signed URL for `key`, valid until `expires_at`.
    pub fn sign(&self, key: &str, expires_at: DateTime<Utc>) -> Result<String, StorageError> {
        let expires = expires_at.timestamp();
        let signature = self.signature(key, expires)?;
        Ok(format!(
            "{}{}/{}?expires={}&signature={}",
            self.base_url, BLOB_ROUTE_PREFIX, key, expires, signature
        ))
    }

    /// Check a presented signature for `key` at time `now`.
    ///
    /// # Errors
    ///
    /// `SignatureRejected` if the URL has expired, the signature is not hex, or it
    /// does not match.
    pub fn verify(
        &self,
        key: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        if now.timestamp() > expires {
            return Err(StorageError::new(StorageErrorKind::SignatureRejected(
                format!("url for {} expired at {}", key, expires),
            )));
        }

        let presented = hex::decode(signature).map_err(|_| {
            StorageError::new(StorageErrorKind::SignatureRejected(format!(
                "malformed signature for {}",
                key
            )))
        })?;

        // verify_slice compares in constant time
        self.mac(key, expires)?
            .verify_slice(&presented)
            .map_err(|_| {
                StorageError::new(StorageErrorKind::SignatureRejected(format!(
                    "bad signature for {}",
                    key
                )))
            })
    }
}
