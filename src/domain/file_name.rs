//! The detached signature file naming convention:
//! `<package file name>[.identifier].sig`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::OnceLock;

use regex::Regex;

use crate::infra::error::{SigningError, SigningResult};

const FILE_EXTENSION: &str = ".sig";
const IDENTIFIER_MIN_LEN: usize = 2;
const IDENTIFIER_MAX_LEN: usize = 32;

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^\.\w+([_-]\w+)*$").unwrap())
}

/// A parsed or constructed detached signature file name.
///
/// Equality and hashing are case-insensitive over the full file name,
/// matching file-system semantics on the platforms packages ship to.
#[derive(Debug, Clone)]
pub struct DetachedSignatureFileName {
    file_name: String,
    package_file_name: String,
    identifier: Option<String>,
    file_extension: String,
}

impl DetachedSignatureFileName {
    /// Construct from parts, validating the identifier grammar and the
    /// `.sig` extension.
    pub fn new(
        package_file_name: impl Into<String>,
        identifier: Option<&str>,
        file_extension: impl Into<String>,
    ) -> SigningResult<Self> {
        let package_file_name = package_file_name.into();
        let file_extension = file_extension.into();

        if package_file_name.is_empty() {
            return Err(SigningError::InvalidFileName(
                "package file name must not be empty".to_string(),
            ));
        }
        if !file_extension.eq_ignore_ascii_case(FILE_EXTENSION) {
            return Err(SigningError::InvalidFileName(format!(
                "invalid signature file extension: {file_extension}"
            )));
        }
        if let Some(identifier) = identifier {
            if !Self::is_valid_file_identifier(identifier) {
                return Err(SigningError::InvalidFileName(format!(
                    "invalid signature file identifier: {identifier}"
                )));
            }
        }

        let mut file_name = package_file_name.clone();
        if let Some(identifier) = identifier {
            file_name.push_str(identifier);
        }
        file_name.push_str(&file_extension);

        Ok(Self {
            file_name,
            package_file_name,
            identifier: identifier.map(str::to_string),
            file_extension,
        })
    }

    /// Parse a candidate file name against the known package file name.
    ///
    /// The output preserves the casing of the package-file-name prefix as
    /// it appeared in the candidate, not the caller-supplied casing.
    pub fn parse(file_name: &str, package_file_name: &str) -> SigningResult<Self> {
        Self::try_parse(file_name, package_file_name).ok_or_else(|| {
            SigningError::InvalidFileName(format!(
                "{file_name} is not a detached signature file name for {package_file_name}"
            ))
        })
    }

    /// Non-failing variant of [`Self::parse`].
    #[must_use]
    pub fn try_parse(file_name: &str, package_file_name: &str) -> Option<Self> {
        if package_file_name.is_empty()
            || file_name.len() < package_file_name.len()
            || !file_name.is_char_boundary(package_file_name.len())
        {
            return None;
        }

        let prefix = &file_name[..package_file_name.len()];
        if !prefix.eq_ignore_ascii_case(package_file_name) {
            return None;
        }

        let extension_start = file_name.rfind('.')?;
        let file_extension = &file_name[extension_start..];
        if !file_extension.eq_ignore_ascii_case(FILE_EXTENSION) {
            return None;
        }

        let without_extension = &file_name[..extension_start];
        if without_extension.len() < prefix.len() {
            return None;
        }

        let identifier = &without_extension[prefix.len()..];
        let identifier = if identifier.is_empty() {
            None
        } else if Self::is_valid_file_identifier(identifier) {
            Some(identifier)
        } else {
            return None;
        };

        // Infallible: every part has just been validated.
        Self::new(prefix, identifier, file_extension).ok()
    }

    /// Whether `identifier` satisfies the file identifier grammar: a dot
    /// followed by 1–31 word characters with optional `-`/`_` separated
    /// groups, 2–32 characters total.
    #[must_use]
    pub fn is_valid_file_identifier(identifier: &str) -> bool {
        let length = identifier.chars().count();
        (IDENTIFIER_MIN_LEN..=IDENTIFIER_MAX_LEN).contains(&length)
            && identifier_pattern().is_match(identifier)
    }

    /// The complete detached signature file name.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The package file name prefix, in the casing it was observed.
    #[must_use]
    pub fn package_file_name(&self) -> &str {
        &self.package_file_name
    }

    #[must_use]
    pub fn identifier(&self) -> Option<&str> {
        self.identifier.as_deref()
    }

    #[must_use]
    pub fn file_extension(&self) -> &str {
        &self.file_extension
    }
}

impl fmt::Display for DetachedSignatureFileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name)
    }
}

impl PartialEq for DetachedSignatureFileName {
    fn eq(&self, other: &Self) -> bool {
        self.file_name.eq_ignore_ascii_case(&other.file_name)
    }
}

impl Eq for DetachedSignatureFileName {}

impl Hash for DetachedSignatureFileName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.file_name.to_ascii_lowercase().hash(state);
    }
}
