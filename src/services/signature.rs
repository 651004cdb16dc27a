//! Signature assembly: pairing a decoded signed message with its
//! signature targets and deriving the signer identity from the signing
//! certificate.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha512};
use x509_cert::der::Decode;
use x509_cert::Certificate;

use crate::domain::constants;
use crate::domain::targets::SignatureTargets;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::collaborators::{MessageSigner, SignedMessage};

const DISTINGUISHED_NAME_KEY: &str = "distinguishedName=";
const PUBLIC_KEY_HASH_KEY: &str = ";publicKeyHash=";

/// A stable, human-readable identity for a signer:
/// `distinguishedName=<dn>;publicKeyHash=sha512:<base64>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerIdentity {
    distinguished_name: String,
    hash_algorithm_name: String,
    public_key_hash: String,
}

impl SignerIdentity {
    /// Derive the identity from a DER-encoded certificate: the subject
    /// distinguished name plus the SHA-512 hash of the subject public key.
    pub fn from_certificate_der(certificate_der: &[u8]) -> SigningResult<Self> {
        let certificate = Certificate::from_der(certificate_der)
            .map_err(|error| SigningError::CertificateError(error.to_string()))?;

        let distinguished_name = certificate.tbs_certificate.subject.to_string();
        let public_key = certificate
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .raw_bytes();
        let public_key_hash = STANDARD.encode(Sha512::digest(public_key));

        Ok(Self {
            distinguished_name,
            hash_algorithm_name: constants::DEFAULT_DIGEST_ALGORITHM_NAME.to_string(),
            public_key_hash,
        })
    }

    /// Parse the string form produced by [`fmt::Display`].
    pub fn parse(text: &str) -> SigningResult<Self> {
        let invalid = || SigningError::InvalidSignerIdentity(text.to_string());

        // The DN may itself contain ';', so split on the last marker.
        let split = text.rfind(PUBLIC_KEY_HASH_KEY).ok_or_else(invalid)?;
        let (dn_part, hash_part) = text.split_at(split);
        let hash_part = &hash_part[PUBLIC_KEY_HASH_KEY.len()..];

        let distinguished_name = dn_part
            .strip_prefix(DISTINGUISHED_NAME_KEY)
            .ok_or_else(invalid)?;
        let (hash_algorithm_name, public_key_hash) =
            hash_part.split_once(':').ok_or_else(invalid)?;

        if distinguished_name.is_empty()
            || hash_algorithm_name != constants::DEFAULT_DIGEST_ALGORITHM_NAME
            || STANDARD.decode(public_key_hash).is_err()
        {
            return Err(invalid());
        }

        Ok(Self {
            distinguished_name: distinguished_name.to_string(),
            hash_algorithm_name: hash_algorithm_name.to_string(),
            public_key_hash: public_key_hash.to_string(),
        })
    }

    #[must_use]
    pub fn distinguished_name(&self) -> &str {
        &self.distinguished_name
    }

    #[must_use]
    pub fn hash_algorithm_name(&self) -> &str {
        &self.hash_algorithm_name
    }

    /// Base64 of the hash over the subject public key bytes.
    #[must_use]
    pub fn public_key_hash(&self) -> &str {
        &self.public_key_hash
    }
}

impl fmt::Display for SignerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}:{}",
            DISTINGUISHED_NAME_KEY,
            self.distinguished_name,
            PUBLIC_KEY_HASH_KEY,
            self.hash_algorithm_name,
            self.public_key_hash
        )
    }
}

/// The signer of a validated signature: certificate plus optional
/// signing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signatory {
    certificate_der: Vec<u8>,
    signing_time: Option<DateTime<Utc>>,
}

impl Signatory {
    fn from_signer(signer: &MessageSigner) -> Self {
        Self {
            certificate_der: signer.certificate_der().to_vec(),
            signing_time: signer.signing_time(),
        }
    }

    #[must_use]
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    #[must_use]
    pub fn signing_time(&self) -> Option<DateTime<Utc>> {
        self.signing_time
    }
}

/// A validated detached signature: the signed message, its decoded
/// targets, the signatory, and the derived signer identity.
#[derive(Debug, Clone)]
pub struct Signature {
    message: SignedMessage,
    targets: SignatureTargets,
    signatory: Signatory,
    signer_identity: SignerIdentity,
}

impl Signature {
    /// Assemble and validate a signature from a decoded signed message and
    /// its decoded targets. The message must carry exactly one signer, the
    /// targets must be at a supported schema version, and the content
    /// digest algorithm must be SHA-512.
    pub fn from_signed_message(
        message: SignedMessage,
        targets: SignatureTargets,
    ) -> SigningResult<Self> {
        if message.signers().len() != 1 {
            return Err(SigningError::InvalidSignedMessage(message.signers().len()));
        }

        if targets.version() != constants::SIGNATURE_TARGETS_VERSION {
            return Err(SigningError::InvalidSignatureTargetsVersion(
                targets.version(),
            ));
        }
        let target = targets.signature_target();
        if target.version() != constants::SIGNATURE_TARGET_VERSION {
            return Err(SigningError::InvalidSignatureTargetVersion(target.version()));
        }

        let algorithm = target.content_digest().digest_algorithm();
        if algorithm != constants::SHA512_OID {
            return Err(SigningError::InvalidDigestAlgorithm(algorithm.to_string()));
        }

        let signatory = Signatory::from_signer(&message.signers()[0]);
        let signer_identity = SignerIdentity::from_certificate_der(signatory.certificate_der())?;

        Ok(Self {
            message,
            targets,
            signatory,
            signer_identity,
        })
    }

    /// The verbatim DER encoding stored in signature files.
    #[must_use]
    pub fn encode(&self) -> &[u8] {
        self.message.encoded()
    }

    #[must_use]
    pub fn message(&self) -> &SignedMessage {
        &self.message
    }

    #[must_use]
    pub fn targets(&self) -> &SignatureTargets {
        &self.targets
    }

    #[must_use]
    pub fn signatory(&self) -> &Signatory {
        &self.signatory
    }

    #[must_use]
    pub fn signer_identity(&self) -> &SignerIdentity {
        &self.signer_identity
    }
}
