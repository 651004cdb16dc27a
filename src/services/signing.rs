//! The signing pipeline: digest the package file, build the signature
//! targets, sign them through the engine, and optionally attach an RFC
//! 3161 timestamp.

use std::path::Path;

use log::{debug, info};
use sha2::{Digest, Sha512};
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;

use crate::domain::constants;
use crate::domain::identity::PackageIdentity;
use crate::domain::targets::{ContentDigest, SignatureTarget, SignatureTargets};
use crate::infra::error::{SigningError, SigningResult};
use crate::services::collaborators::{SigningEngine, TimestampAuthorityClient};
use crate::services::signature::Signature;

const READ_BUFFER_SIZE: usize = 4096;

/// Stream a file through SHA-512. Cancellation is observed between reads.
pub async fn compute_file_digest(
    path: &Path,
    cancellation: &CancellationToken,
) -> SigningResult<Vec<u8>> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        if cancellation.is_cancelled() {
            return Err(SigningError::OperationCancelled);
        }
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().to_vec())
}

/// Build a signature target from a package identity and a precomputed
/// content digest.
pub fn create_signature_target(
    package_identity: PackageIdentity,
    digest_algorithm_oid: &str,
    digest: Vec<u8>,
) -> SigningResult<SignatureTarget> {
    let content_digest = ContentDigest::new(digest_algorithm_oid, digest)?;
    Ok(SignatureTarget::new(package_identity, content_digest))
}

/// Signs package files through a [`SigningEngine`], optionally attaching
/// timestamps from a [`TimestampAuthorityClient`].
pub struct PackageSigner<'a> {
    engine: &'a dyn SigningEngine,
    certificate_der: Vec<u8>,
    timestamping: Option<(&'a dyn TimestampAuthorityClient, String)>,
}

impl<'a> PackageSigner<'a> {
    #[must_use]
    pub fn new(engine: &'a dyn SigningEngine, certificate_der: Vec<u8>) -> Self {
        Self {
            engine,
            certificate_der,
            timestamping: None,
        }
    }

    /// Attach timestamps from `client` at `url` to every produced signature.
    #[must_use]
    pub fn with_timestamping(
        mut self,
        client: &'a dyn TimestampAuthorityClient,
        url: impl Into<String>,
    ) -> Self {
        self.timestamping = Some((client, url.into()));
        self
    }

    /// Digest `package_path`, sign the resulting targets, and return the
    /// assembled signature.
    pub async fn sign_file(
        &self,
        package_path: &Path,
        package_identity: PackageIdentity,
        cancellation: &CancellationToken,
    ) -> SigningResult<Signature> {
        info!("signing {} as {}", package_path.display(), package_identity);

        let digest = compute_file_digest(package_path, cancellation).await?;
        let target = create_signature_target(package_identity, constants::SHA512_OID, digest)?;
        let targets = SignatureTargets::new(target);
        let payload = targets.encode()?;
        debug!("signature targets payload: {} bytes", payload.len());

        let mut message = self
            .engine
            .sign(&payload, &self.certificate_der, cancellation)
            .await?;

        if let Some((client, url)) = &self.timestamping {
            if cancellation.is_cancelled() {
                return Err(SigningError::OperationCancelled);
            }
            debug!("requesting timestamp from {url}");
            let signature_digest = Sha512::digest(message.encoded());
            let token = client
                .request_timestamp(url, &signature_digest, cancellation)
                .await?;
            message = self.engine.attach_timestamp(message, &token)?;
        }

        Signature::from_signed_message(message, targets)
    }
}
