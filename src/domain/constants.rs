//! Centralized constants for object identifiers and schema versions.
//! Keep this intentionally small; only broadly reused literals should live here.

/// The object identifier for the SHA-256 hash algorithm (RFC 8017 appendix B.1).
///
/// Reserved: the signing and validation paths currently accept only
/// [`SHA512_OID`].
pub const SHA256_OID: &str = "2.16.840.1.101.3.4.2.1";

/// The object identifier for the SHA-512 hash algorithm (RFC 8017 appendix B.1).
pub const SHA512_OID: &str = "2.16.840.1.101.3.4.2.3";

/// RFC 5652 "id-data" content type (PKCS#7).
pub const PKCS7_DATA_OID: &str = "1.2.840.113549.1.7.1";

/// RFC 5652 "signing-time" authenticated attribute.
pub const SIGNING_TIME_OID: &str = "1.2.840.113549.1.9.5";

/// RFC 5126 (CAdES) signature-time-stamp-token unauthenticated attribute.
pub const SIGNATURE_TIMESTAMP_TOKEN_OID: &str = "1.2.840.113549.1.9.16.2.14";

/// Current `SignatureTargets` schema version.
pub const SIGNATURE_TARGETS_VERSION: i64 = 1;

/// Current `SignatureTarget` schema version.
pub const SIGNATURE_TARGET_VERSION: i64 = 1;

/// Default digest/hash algorithm name used in signer identity strings.
pub const DEFAULT_DIGEST_ALGORITHM_NAME: &str = "sha512";

/// PEM encapsulation boundary label for signature blocks.
pub const PEM_FILE_SIGNATURE_LABEL: &str = "FILE SIGNATURE";

/// PEM encapsulation boundary label for signing request blocks.
pub const PEM_FILE_SIGNING_REQUEST_LABEL: &str = "FILE SIGNING REQUEST";

/// Supported hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }

    #[must_use]
    pub fn oid(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => SHA256_OID,
            HashAlgorithm::Sha512 => SHA512_OID,
        }
    }

    #[must_use]
    pub fn digest_size(&self) -> usize {
        match self {
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha512 => 64,
        }
    }
}
