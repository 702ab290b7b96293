//! Pre-signed object upload URLs.
//!
//! A URL authorizes one `PUT` of one object key with one content type until
//! its expiry. The signature is HMAC-SHA256 over
//! `PUT\n<key>\n<content-type>\n<expires>`, hex encoded.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use thiserror::Error;
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// Path prefix of the upload endpoint, relative to the site root.
pub const UPLOAD_PATH: &str = "uploads/objects";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("upload URL has expired")]
    Expired,

    #[error("upload URL signature is invalid")]
    Invalid,

    #[error("signing key rejected")]
    Key,

    #[error("cannot build upload URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Signs and verifies upload URLs.
#[derive(Clone)]
pub struct UploadSigner {
    key: SecretString,
    ttl: Duration,
}

impl std::fmt::Debug for UploadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSigner")
            .field("key", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl UploadSigner {
    #[must_use]
    pub const fn new(key: SecretString, ttl: Duration) -> Self {
        Self { key, ttl }
    }

    /// The absolute URL a client PUTs `key` to.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` cannot be joined with the key.
    pub fn presign(
        &self,
        base_url: &Url,
        key: &str,
        content_type: &str,
        now: DateTime<Utc>,
    ) -> Result<Url, SignatureError> {
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expires = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
            .timestamp();
        let signature = hex::encode(self.mac(key, content_type, expires)?.finalize().into_bytes());

        let mut url = base_url.join(&format!("/{UPLOAD_PATH}/{key}"))?;
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &signature);
        Ok(url)
    }

    /// Check a signature presented with a PUT.
    ///
    /// # Errors
    ///
    /// Returns `SignatureError::Invalid` on any mismatch and
    /// `SignatureError::Expired` for a valid but stale URL.
    pub fn verify(
        &self,
        key: &str,
        content_type: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), SignatureError> {
        let provided = hex::decode(signature).map_err(|_| SignatureError::Invalid)?;
        self.mac(key, content_type, expires)?
            .verify_slice(&provided)
            .map_err(|_| SignatureError::Invalid)?;

        if now.timestamp() > expires {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn mac(&self, key: &str, content_type: &str, expires: i64) -> Result<HmacSha256, SignatureError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(self.key.expose_secret().as_bytes())
            .map_err(|_| SignatureError::Key)?;
        mac.update(format!("PUT\n{key}\n{content_type}\n{expires}").as_bytes());
        Ok(mac)
    }
}
