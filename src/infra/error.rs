//! Error types and result definitions for detached package signing.

use thiserror::Error;

/// Result type for signing operations
pub type SigningResult<T> = Result<T, SigningError>;

/// Error taxonomy for the TLV codec, the signature-target schema, and the
/// detached signature file format.
///
/// Every decode failure is fatal to the current decode attempt; callers must
/// not retry or fall back to partial results.
#[derive(Error, Debug, miette::Diagnostic)]
pub enum SigningError {
    /// Tag, class, constructed-flag, or length mismatch at the TLV layer.
    /// Carries the universal tag the typed reader expected.
    #[error("malformed ASN.1 encoding: expected tag 0x{expected_tag:02X}")]
    MalformedEncoding { expected_tag: u8 },

    /// Extra bytes remained after the last expected field of a structure.
    #[error("unexpected trailing data after {0}")]
    UnexpectedTrailingData(&'static str),

    /// A signature-targets field used an encoding form the schema forbids
    /// (constructed scalar, indefinite length).
    #[error("invalid signature targets encoding: {0}")]
    InvalidTargetsEncoding(&'static str),

    #[error("unsupported signature targets version: {0}")]
    InvalidSignatureTargetsVersion(i64),

    #[error("unsupported signature target version: {0}")]
    InvalidSignatureTargetVersion(i64),

    #[error("unsupported content digest algorithm: {0}")]
    InvalidDigestAlgorithm(String),

    #[error("invalid package version string: {0}")]
    InvalidVersionString(String),

    /// The signed message had zero or multiple signers.
    #[error("invalid signed message: expected exactly one signer, found {0}")]
    InvalidSignedMessage(usize),

    /// The signed message payload content type was not PKCS#7 id-data.
    #[error("invalid signature content type: {0}")]
    InvalidContentType(String),

    #[error("invalid detached signature file name: {0}")]
    InvalidFileName(String),

    #[error("invalid PEM text: {0}")]
    InvalidPemText(&'static str),

    #[error("invalid base64 text")]
    InvalidBase64,

    #[error("invalid signer identity string: {0}")]
    InvalidSignerIdentity(String),

    #[error("certificate error: {0}")]
    CertificateError(String),

    #[error("signature creation error: {0}")]
    SignatureError(String),

    #[error("timestamp error: {0}")]
    TimestampError(String),

    #[error("configuration error: {0}")]
    ConfigurationError(String),

    #[error("operation cancelled")]
    OperationCancelled,

    #[error("IO error: {0}")]
    IoError(String),
}

impl From<std::io::Error> for SigningError {
    fn from(error: std::io::Error) -> Self {
        SigningError::IoError(error.to_string())
    }
}

impl From<base64::DecodeError> for SigningError {
    fn from(_: base64::DecodeError) -> Self {
        SigningError::InvalidBase64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_encoding_reports_expected_tag() {
        let err = SigningError::MalformedEncoding { expected_tag: 0x30 };
        assert_eq!(
            err.to_string(),
            "malformed ASN.1 encoding: expected tag 0x30"
        );
    }

    #[test]
    fn io_error_conversion_preserves_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing file");
        let err: SigningError = io.into();
        assert!(matches!(err, SigningError::IoError(ref msg) if msg.contains("missing file")));
    }
}
