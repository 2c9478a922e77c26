use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum SignerError {
    #[error("shared key is not valid base64: {0}")]
    InvalidKey(#[from] base64::DecodeError),

    #[error("shared key cannot be used as an HMAC key")]
    InvalidKeyLength,
}

/// Fields covered by the shared-key signature of one request
#[derive(Debug, Clone, Copy)]
pub struct SigningInput<'a> {
    pub method: &'a str,
    pub content_length: usize,
    pub content_type: &'a str,
    /// RFC 1123 date, sent verbatim as `x-ms-date`
    pub date: &'a str,
    pub resource: &'a str,
}

impl SigningInput<'_> {
    pub fn canonical_string(&self) -> String {
        format!(
            "{}\n{}\n{}\nx-ms-date:{}\n{}",
            self.method, self.content_length, self.content_type, self.date, self.resource
        )
    }
}

/// Computes `SharedKey` authorization headers for one workspace.
///
/// The key is decoded once at construction so that a malformed secret is
/// reported before any request is built.
#[derive(Clone)]
pub struct RequestSigner {
    workspace_id: String,
    key: Vec<u8>,
}

impl RequestSigner {
    pub fn new(workspace_id: impl Into<String>, shared_key: &str) -> Result<Self, SignerError> {
        let key = STANDARD.decode(shared_key.trim())?;
        Ok(Self {
            workspace_id: workspace_id.into(),
            key,
        })
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// Build the `Authorization` header value for a request
    pub fn sign(&self, input: &SigningInput<'_>) -> Result<String, SignerError> {
        let mut mac =
            HmacSha256::new_from_slice(&self.key).map_err(|_| SignerError::InvalidKeyLength)?;
        mac.update(input.canonical_string().as_bytes());
        let digest = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!("SharedKey {}:{}", self.workspace_id, digest))
    }
}

impl std::fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSigner")
            .field("workspace_id", &self.workspace_id)
            .field("key", &"<redacted>")
            .finish()
    }
}

/// Format a timestamp the way the `x-ms-date` header expects it,
/// e.g. `Mon, 19 Oct 2026 10:15:30 GMT`.
pub fn rfc1123_date(at: DateTime<Utc>) -> String {
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
