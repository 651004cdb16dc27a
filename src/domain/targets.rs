//! The signature-target schema: the versioned structure binding a package
//! identity to a content digest.
//!
//! ```text
//! SignatureTargets ::= SEQUENCE {
//!   version            INTEGER { v1(1) },
//!   signatureTarget    SignatureTarget }
//!
//! SignatureTarget ::= SEQUENCE {
//!   version            INTEGER { v1(1) },
//!   packageId          UTF8String,
//!   packageVersion     UTF8String,
//!   contentDigest      ContentDigest }
//!
//! ContentDigest ::= SEQUENCE {
//!   digestAlgorithm    OBJECT IDENTIFIER,
//!   digest             OCTET STRING }
//! ```
//!
//! Encoding is strict DER throughout: primitive definite-length scalars,
//! constructed definite-length sequences, canonical lengths. Decoding
//! rejects every other BER form.

use crate::domain::asn1::{writer, Asn1Integer, ByteReader, EncodingForm, TlvValue};
use crate::domain::constants;
use crate::domain::identity::PackageIdentity;
use crate::infra::error::{SigningError, SigningResult};

const I32_RANGE: std::ops::RangeInclusive<i64> = (i32::MIN as i64)..=(i32::MAX as i64);

/// A digest algorithm OID paired with the digest it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    digest_algorithm: String,
    digest: Vec<u8>,
}

impl ContentDigest {
    /// Create a content digest. The algorithm must be a well-formed dotted
    /// OID and the digest must be non-empty.
    pub fn new(digest_algorithm: impl Into<String>, digest: Vec<u8>) -> SigningResult<Self> {
        let digest_algorithm = digest_algorithm.into();
        writer::encode_oid(&digest_algorithm)?;
        if digest.is_empty() {
            return Err(SigningError::InvalidTargetsEncoding(
                "content digest must not be empty",
            ));
        }
        Ok(Self {
            digest_algorithm,
            digest,
        })
    }

    #[must_use]
    pub fn digest_algorithm(&self) -> &str {
        &self.digest_algorithm
    }

    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    fn as_tlv(&self) -> SigningResult<TlvValue> {
        Ok(TlvValue::sequence(&[
            TlvValue::object_identifier(&self.digest_algorithm)?,
            TlvValue::octet_string(&self.digest, EncodingForm::PrimitiveDefinite),
        ]))
    }

    fn decode_content(content: &[u8]) -> SigningResult<Self> {
        let mut reader = ByteReader::new(content);

        let (digest_algorithm, _) = reader.read_object_identifier()?;

        let (digest, form) = reader.read_octet_string()?;
        if form != EncodingForm::PrimitiveDefinite {
            return Err(SigningError::InvalidTargetsEncoding(
                "digest must be a primitive definite-length octet string",
            ));
        }

        if !reader.is_empty() {
            return Err(SigningError::UnexpectedTrailingData("content digest"));
        }

        Self::new(digest_algorithm, digest)
    }
}

/// One signed target: a package identity and the digest of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTarget {
    version: i64,
    package_identity: PackageIdentity,
    content_digest: ContentDigest,
}

impl SignatureTarget {
    /// Create a target at the current schema version.
    #[must_use]
    pub fn new(package_identity: PackageIdentity, content_digest: ContentDigest) -> Self {
        Self {
            version: constants::SIGNATURE_TARGET_VERSION,
            package_identity,
            content_digest,
        }
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    #[must_use]
    pub fn package_identity(&self) -> &PackageIdentity {
        &self.package_identity
    }

    #[must_use]
    pub fn content_digest(&self) -> &ContentDigest {
        &self.content_digest
    }

    fn as_tlv(&self) -> SigningResult<TlvValue> {
        Ok(TlvValue::sequence(&[
            TlvValue::integer(&Asn1Integer::from_i64(self.version)),
            TlvValue::utf8_string(self.package_identity.id(), EncodingForm::PrimitiveDefinite),
            TlvValue::utf8_string(
                &self.package_identity.normalized_version_string(),
                EncodingForm::PrimitiveDefinite,
            ),
            self.content_digest.as_tlv()?,
        ]))
    }

    fn decode_content(content: &[u8]) -> SigningResult<Self> {
        let mut reader = ByteReader::new(content);

        let version = read_version(&mut reader, SigningError::InvalidSignatureTargetVersion)?;

        let (package_id, form) = reader.read_utf8_string()?;
        if form != EncodingForm::PrimitiveDefinite {
            return Err(SigningError::InvalidTargetsEncoding(
                "package id must be a primitive definite-length UTF8String",
            ));
        }

        let (package_version, form) = reader.read_utf8_string()?;
        if form != EncodingForm::PrimitiveDefinite {
            return Err(SigningError::InvalidTargetsEncoding(
                "package version must be a primitive definite-length UTF8String",
            ));
        }

        let (digest_content, _) = reader.read_sequence()?;

        if !reader.is_empty() {
            return Err(SigningError::UnexpectedTrailingData("signature target"));
        }

        let package_identity = PackageIdentity::parse(package_id, &package_version)?;
        let content_digest = ContentDigest::decode_content(&digest_content)?;

        Ok(Self {
            version,
            package_identity,
            content_digest,
        })
    }
}

/// The top-level structure whose DER encoding becomes the signed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureTargets {
    version: i64,
    signature_target: SignatureTarget,
}

impl SignatureTargets {
    /// Wrap a target at the current schema version.
    #[must_use]
    pub fn new(signature_target: SignatureTarget) -> Self {
        Self {
            version: constants::SIGNATURE_TARGETS_VERSION,
            signature_target,
        }
    }

    #[must_use]
    pub fn version(&self) -> i64 {
        self.version
    }

    #[must_use]
    pub fn signature_target(&self) -> &SignatureTarget {
        &self.signature_target
    }

    /// Encode to DER bytes.
    pub fn encode(&self) -> SigningResult<Vec<u8>> {
        let tlv = TlvValue::sequence(&[
            TlvValue::integer(&Asn1Integer::from_i64(self.version)),
            self.signature_target.as_tlv()?,
        ]);
        Ok(tlv.encode())
    }

    /// Decode from DER bytes, validating encoding forms, versions, and the
    /// absence of trailing data at every nesting level.
    pub fn decode(bytes: &[u8]) -> SigningResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let (content, _) = reader.read_sequence()?;
        if !reader.is_empty() {
            return Err(SigningError::UnexpectedTrailingData("signature targets"));
        }

        let mut reader = ByteReader::new(&content);
        let version = read_version(&mut reader, SigningError::InvalidSignatureTargetsVersion)?;
        let (target_content, _) = reader.read_sequence()?;
        if !reader.is_empty() {
            return Err(SigningError::UnexpectedTrailingData("signature targets"));
        }

        let signature_target = SignatureTarget::decode_content(&target_content)?;

        Ok(Self {
            version,
            signature_target,
        })
    }
}

/// Read a version INTEGER and require it to fit in a 32-bit signed range.
fn read_version(
    reader: &mut ByteReader<'_>,
    out_of_range: fn(i64) -> SigningError,
) -> SigningResult<i64> {
    let (value, _) = reader.read_integer()?;
    let version = value.to_i64().unwrap_or(i64::MAX);
    if !I32_RANGE.contains(&version) {
        return Err(out_of_range(version));
    }
    Ok(version)
}
