//! Collaborator seams: the cryptographic engine, the timestamp authority
//! client, and the certificate store are consumed through traits so the
//! signing pipeline stays independent of any particular CMS or hardware
//! backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::infra::error::SigningResult;

/// One signer of a decoded signed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSigner {
    certificate_der: Vec<u8>,
    signing_time: Option<DateTime<Utc>>,
}

impl MessageSigner {
    #[must_use]
    pub fn new(certificate_der: Vec<u8>, signing_time: Option<DateTime<Utc>>) -> Self {
        Self {
            certificate_der,
            signing_time,
        }
    }

    /// DER bytes of the signer's certificate.
    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// Signed attribute signing time, when the signer carried one.
    #[must_use]
    pub fn signing_time(&self) -> Option<DateTime<Utc>> {
        self.signing_time
    }
}

/// A signed message as produced or decoded by a [`SigningEngine`]: the
/// opaque DER encoding plus the decoded view the pipeline validates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    encoded: Vec<u8>,
    content_type: String,
    content: Vec<u8>,
    signers: Vec<MessageSigner>,
}

impl SignedMessage {
    #[must_use]
    pub fn new(
        encoded: Vec<u8>,
        content_type: impl Into<String>,
        content: Vec<u8>,
        signers: Vec<MessageSigner>,
    ) -> Self {
        Self {
            encoded,
            content_type: content_type.into(),
            content,
            signers,
        }
    }

    /// The full DER encoding, stored verbatim in signature files.
    #[must_use]
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }

    /// Dotted OID of the encapsulated content type.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The encapsulated payload bytes.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    #[must_use]
    pub fn signers(&self) -> &[MessageSigner] {
        &self.signers
    }
}

/// Produces and decodes signed messages over opaque payloads.
#[async_trait]
pub trait SigningEngine: Send + Sync {
    /// Sign `payload` with the key behind `certificate_der`, returning the
    /// signed message with the payload encapsulated.
    async fn sign(
        &self,
        payload: &[u8],
        certificate_der: &[u8],
        cancellation: &CancellationToken,
    ) -> SigningResult<SignedMessage>;

    /// Decode a signed message from its DER encoding without verifying it.
    fn decode(&self, encoded: &[u8]) -> SigningResult<SignedMessage>;

    /// Attach a timestamp token to the sole signer as an unsigned
    /// attribute, returning the re-encoded message.
    fn attach_timestamp(
        &self,
        message: SignedMessage,
        token_der: &[u8],
    ) -> SigningResult<SignedMessage>;
}

/// Requests RFC 3161 timestamp tokens over a signature digest.
#[async_trait]
pub trait TimestampAuthorityClient: Send + Sync {
    async fn request_timestamp(
        &self,
        url: &str,
        signature_digest: &[u8],
        cancellation: &CancellationToken,
    ) -> SigningResult<Vec<u8>>;
}

/// Criteria for selecting a signing certificate from a store.
#[derive(Debug, Clone, Default)]
pub struct CertificateQuery {
    pub subject_contains: Option<String>,
    pub require_code_signing: bool,
    pub include_expired: bool,
}

/// A certificate surfaced by a [`CertificateStore`] lookup.
#[derive(Debug, Clone)]
pub struct CertificateInfo {
    pub certificate_der: Vec<u8>,
    pub subject: String,
    pub issuer: String,
    pub not_after: DateTime<Utc>,
    pub sha256_fingerprint: String,
}

/// Looks up candidate signing certificates.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    async fn find_certificates(
        &self,
        query: &CertificateQuery,
    ) -> SigningResult<Vec<CertificateInfo>>;
}
