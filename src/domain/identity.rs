//! Package identity: an id plus a mandatory normalized version.

use std::fmt;

use semver::Version;

use crate::infra::error::{SigningError, SigningResult};

/// The identity of the package a signature covers. The version is not
/// optional; a signature target without an explicit package version is
/// unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageIdentity {
    id: String,
    version: Version,
}

impl PackageIdentity {
    pub fn new(id: impl Into<String>, version: Version) -> SigningResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(SigningError::InvalidFileName(
                "package id must not be empty".to_string(),
            ));
        }
        Ok(Self { id, version })
    }

    /// Parse the version portion from its string form.
    pub fn parse(id: impl Into<String>, version: &str) -> SigningResult<Self> {
        let version = Version::parse(version)
            .map_err(|_| SigningError::InvalidVersionString(version.to_string()))?;
        Self::new(id, version)
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// The normalized version string embedded in signature targets.
    #[must_use]
    pub fn normalized_version_string(&self) -> String {
        self.version.to_string()
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.version)
    }
}
