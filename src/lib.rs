//! Detached package signing: an ASN.1 BER/DER TLV codec, the versioned
//! signature-target schema, and the PEM-based detached signature file
//! format, with signing and timestamping driven through pluggable
//! collaborator traits.
//!
//! The typical flow is [`sign_package_file`] to produce a `.sig` file next
//! to a package, and [`read_signatures`] to load it back:
//!
//! ```no_run
//! # async fn example(engine: &dyn pkgsign::SigningEngine, cert: Vec<u8>) -> pkgsign::SigningResult<()> {
//! use std::path::Path;
//! use tokio_util::sync::CancellationToken;
//!
//! let identity = pkgsign::PackageIdentity::parse("NuGet.Core", "2.12.0")?;
//! let token = CancellationToken::new();
//! pkgsign::sign_package_file(
//!     Path::new("NuGet.Core.2.12.0.nupkg"),
//!     identity,
//!     engine,
//!     cert,
//!     None,
//!     &token,
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod domain;
pub mod infra;
pub mod services;

use std::path::Path;

use log::info;
use tokio_util::sync::CancellationToken;

pub use domain::asn1::{Asn1Integer, ByteReader, Class, EncodingForm, TlvValue};
pub use domain::constants::{self, HashAlgorithm};
pub use domain::file_name::DetachedSignatureFileName;
pub use domain::identity::PackageIdentity;
pub use domain::targets::{ContentDigest, SignatureTarget, SignatureTargets};
pub use infra::config::SigningConfiguration;
pub use infra::error::{SigningError, SigningResult};
pub use services::collaborators::{
    CertificateInfo, CertificateQuery, CertificateStore, MessageSigner, SignedMessage,
    SigningEngine, TimestampAuthorityClient,
};
pub use services::file_format::{DetachedSignatureFile, FileSigningRequest};
pub use services::pem::PemData;
pub use services::signature::{Signatory, Signature, SignerIdentity};
pub use services::signing::{compute_file_digest, create_signature_target, PackageSigner};

/// Sign `package_path` and write the detached signature file next to it,
/// returning the path of the written file.
///
/// The signature file name follows the detached naming convention:
/// `<package file name>[.identifier].sig`.
pub async fn sign_package_file(
    package_path: &Path,
    package_identity: PackageIdentity,
    engine: &dyn SigningEngine,
    certificate_der: Vec<u8>,
    file_identifier: Option<&str>,
    cancellation: &CancellationToken,
) -> SigningResult<std::path::PathBuf> {
    let package_file_name = package_path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            SigningError::InvalidFileName(format!(
                "package path has no file name: {}",
                package_path.display()
            ))
        })?;

    let signature_file_name =
        DetachedSignatureFileName::new(package_file_name, file_identifier, ".sig")?;

    let signer = PackageSigner::new(engine, certificate_der);
    let signature = signer
        .sign_file(package_path, package_identity, cancellation)
        .await?;

    let signature_path = package_path.with_file_name(signature_file_name.file_name());
    DetachedSignatureFile::new(vec![signature])
        .write_file(&signature_path, cancellation)
        .await?;

    Ok(signature_path)
}

/// Read and validate every signature in the detached signature file at
/// `path`.
pub async fn read_signatures(
    path: &Path,
    engine: &dyn SigningEngine,
    cancellation: &CancellationToken,
) -> SigningResult<Vec<Signature>> {
    info!("reading signatures from {}", path.display());
    let file = DetachedSignatureFile::read_file(path, engine, cancellation).await?;
    Ok(file.signatures().to_vec())
}
