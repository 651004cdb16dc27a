//! The detached signature file format: one PEM block per signature, plus
//! the signing-request companion format.
//!
//! File writes go to a temporary sibling first and are renamed into place
//! only on success, so a failed write never leaves a truncated file at
//! the destination.

use std::path::{Path, PathBuf};

use log::{debug, info};
use tokio_util::sync::CancellationToken;

use crate::domain::constants;
use crate::domain::targets::SignatureTargets;
use crate::infra::error::{SigningError, SigningResult};
use crate::services::collaborators::SigningEngine;
use crate::services::pem::{self, PemData};
use crate::services::signature::Signature;

/// A detached signature file: zero or more signatures in order of
/// appearance.
#[derive(Debug, Clone)]
pub struct DetachedSignatureFile {
    signatures: Vec<Signature>,
}

impl DetachedSignatureFile {
    #[must_use]
    pub fn new(signatures: Vec<Signature>) -> Self {
        Self { signatures }
    }

    #[must_use]
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// Parse signature file text. Blocks with other labels are ignored;
    /// every `FILE SIGNATURE` block must decode and validate.
    pub fn parse(
        text: &str,
        engine: &dyn SigningEngine,
        cancellation: &CancellationToken,
    ) -> SigningResult<Self> {
        let blocks = pem::parse_blocks(text, cancellation)?;
        let mut signatures = Vec::new();

        for block in blocks {
            if block.label() != constants::PEM_FILE_SIGNATURE_LABEL {
                continue;
            }
            if cancellation.is_cancelled() {
                return Err(SigningError::OperationCancelled);
            }
            signatures.push(decode_signature(block.data(), engine)?);
        }

        debug!("parsed {} signature(s)", signatures.len());
        Ok(Self::new(signatures))
    }

    /// Read and parse a signature file from disk.
    pub async fn read_file(
        path: &Path,
        engine: &dyn SigningEngine,
        cancellation: &CancellationToken,
    ) -> SigningResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text, engine, cancellation)
    }

    /// Render the file text: one PEM block per signature.
    pub fn to_file_string(&self) -> SigningResult<String> {
        let mut out = String::new();
        for signature in &self.signatures {
            let block = PemData::create(
                signature.encode().to_vec(),
                constants::PEM_FILE_SIGNATURE_LABEL,
            )?;
            out.push_str(&block.to_block_string());
        }
        Ok(out)
    }

    /// Write the signature file to `path` via a temporary sibling.
    pub async fn write_file(
        &self,
        path: &Path,
        cancellation: &CancellationToken,
    ) -> SigningResult<()> {
        let text = self.to_file_string()?;
        write_atomically(path, text.as_bytes(), cancellation).await?;
        info!(
            "wrote {} signature(s) to {}",
            self.signatures.len(),
            path.display()
        );
        Ok(())
    }
}

fn decode_signature(encoded: &[u8], engine: &dyn SigningEngine) -> SigningResult<Signature> {
    let message = engine.decode(encoded)?;
    if message.content_type() != constants::PKCS7_DATA_OID {
        return Err(SigningError::InvalidContentType(
            message.content_type().to_string(),
        ));
    }
    let targets = SignatureTargets::decode(message.content())?;
    Signature::from_signed_message(message, targets)
}

/// A request for a third party to sign a precomputed package digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSigningRequest {
    digest: Vec<u8>,
}

impl FileSigningRequest {
    /// Create a request over a non-empty package content digest.
    pub fn create(digest: Vec<u8>) -> SigningResult<Self> {
        if digest.is_empty() {
            return Err(SigningError::SignatureError(
                "signing request digest must not be empty".to_string(),
            ));
        }
        Ok(Self { digest })
    }

    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    /// Render the request as a single PEM block.
    pub fn to_file_string(&self) -> SigningResult<String> {
        let block = PemData::create(
            self.digest.clone(),
            constants::PEM_FILE_SIGNING_REQUEST_LABEL,
        )?;
        Ok(block.to_block_string())
    }

    /// Parse request text: exactly one `FILE SIGNING REQUEST` block.
    pub fn parse(text: &str, cancellation: &CancellationToken) -> SigningResult<Self> {
        let blocks = pem::parse_blocks(text, cancellation)?;
        let mut requests = blocks
            .into_iter()
            .filter(|block| block.label() == constants::PEM_FILE_SIGNING_REQUEST_LABEL);

        let block = requests
            .next()
            .ok_or(SigningError::InvalidPemText("signing request block not found"))?;
        if requests.next().is_some() {
            return Err(SigningError::InvalidPemText(
                "multiple signing request blocks",
            ));
        }

        Self::create(block.data().to_vec())
    }

    pub async fn read_file(
        path: &Path,
        cancellation: &CancellationToken,
    ) -> SigningResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text, cancellation)
    }

    pub async fn write_file(
        &self,
        path: &Path,
        cancellation: &CancellationToken,
    ) -> SigningResult<()> {
        let text = self.to_file_string()?;
        write_atomically(path, text.as_bytes(), cancellation).await
    }
}

async fn write_atomically(
    path: &Path,
    bytes: &[u8],
    cancellation: &CancellationToken,
) -> SigningResult<()> {
    if cancellation.is_cancelled() {
        return Err(SigningError::OperationCancelled);
    }

    let temp_path = temp_sibling(path);
    if let Err(error) = tokio::fs::write(&temp_path, bytes).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error.into());
    }
    if let Err(error) = tokio::fs::rename(&temp_path, path).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(error.into());
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
