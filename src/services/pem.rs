//! PEM text layer: base64 block framing with labeled encapsulation
//! boundaries, per the RFC 7468 parsing rules.

use std::sync::OnceLock;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::infra::error::{SigningError, SigningResult};

/// Label characters: printable ASCII excluding `-` and lowercase letters.
const LABEL_CHAR: &str = r"[\x21-\x2C\x2E-\x60\x7B-\x7E]";

const LINE_WIDTH: usize = 64;

fn label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(&format!("^(?:{LABEL_CHAR}+(?:[- ]{LABEL_CHAR}+)*)?$")).unwrap())
}

fn begin_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(
            "^-{{5}}BEGIN (?<label>(?:{LABEL_CHAR}+(?:[- ]{LABEL_CHAR}+)*)?)-{{5}}[ \t]*$"
        ))
        .unwrap()
    })
}

fn end_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(&format!(
            "^-{{5}}END (?<label>(?:{LABEL_CHAR}+(?:[- ]{LABEL_CHAR}+)*)?)-{{5}}[ \t]*$"
        ))
        .unwrap()
    })
}

fn base64_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9+/]*={0,2}[ \t]*$").unwrap())
}

/// One labeled PEM block: the label and the decoded binary data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemData {
    label: String,
    data: Vec<u8>,
}

impl PemData {
    /// Create a block from binary data and an encapsulation boundary label.
    pub fn create(data: Vec<u8>, label: impl Into<String>) -> SigningResult<Self> {
        let label = label.into();
        if !label_pattern().is_match(&label) {
            return Err(SigningError::InvalidPemText(
                "invalid encapsulation boundary label",
            ));
        }
        Ok(Self { label, data })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Render the block: five-hyphen boundaries and base64 wrapped at 64
    /// characters per line.
    #[must_use]
    pub fn to_block_string(&self) -> String {
        let base64_text = STANDARD.encode(&self.data);
        let mut out = String::with_capacity(base64_text.len() + self.label.len() * 2 + 64);

        out.push_str("-----BEGIN ");
        out.push_str(&self.label);
        out.push_str("-----\n");

        let bytes = base64_text.as_bytes();
        for chunk in bytes.chunks(LINE_WIDTH) {
            // Base64 output is always ASCII.
            out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
            out.push('\n');
        }

        out.push_str("-----END ");
        out.push_str(&self.label);
        out.push_str("-----\n");
        out
    }
}

/// Parse every PEM block in `text`, in order of appearance. Text outside
/// encapsulation boundaries is ignored. Cancellation is checked before
/// each new block.
pub fn parse_blocks(text: &str, cancellation: &CancellationToken) -> SigningResult<Vec<PemData>> {
    let mut blocks = Vec::new();
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let Some(captures) = begin_pattern().captures(line) else {
            continue;
        };

        if cancellation.is_cancelled() {
            return Err(SigningError::OperationCancelled);
        }

        let label = captures["label"].to_string();
        let mut base64_text = String::new();
        let mut closed = false;

        for line in lines.by_ref() {
            if let Some(end) = end_pattern().captures(line) {
                if end["label"] != label {
                    return Err(SigningError::InvalidPemText(
                        "mismatched encapsulation boundary label",
                    ));
                }
                closed = true;
                break;
            }
            if !base64_line_pattern().is_match(line) {
                return Err(SigningError::InvalidPemText("invalid base64 data"));
            }
            base64_text.push_str(line.trim_end_matches(['\t', ' ']));
        }

        if !closed {
            return Err(SigningError::InvalidPemText(
                "post-encapsulation boundary not found",
            ));
        }

        let data = STANDARD.decode(&base64_text)?;
        blocks.push(PemData::create(data, label)?);
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> CancellationToken {
        CancellationToken::new()
    }

    #[test]
    fn block_round_trip() {
        let data: Vec<u8> = (0..200).collect();
        let block = PemData::create(data.clone(), "FILE SIGNATURE").unwrap();
        let text = block.to_block_string();

        assert!(text.starts_with("-----BEGIN FILE SIGNATURE-----\n"));
        assert!(text.ends_with("-----END FILE SIGNATURE-----\n"));
        for line in text.lines() {
            assert!(line.len() <= 64 + 5 + 26);
        }

        let parsed = parse_blocks(&text, &token()).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].label(), "FILE SIGNATURE");
        assert_eq!(parsed[0].data(), &data[..]);
    }

    #[test]
    fn base64_lines_wrap_at_64_chars() {
        let block = PemData::create(vec![0xAB; 100], "TEST").unwrap();
        let text = block.to_block_string();
        let data_lines: Vec<&str> = text
            .lines()
            .filter(|l| !l.starts_with("-----"))
            .collect();
        assert!(data_lines.len() > 1);
        for line in &data_lines[..data_lines.len() - 1] {
            assert_eq!(line.len(), 64);
        }
    }

    #[test]
    fn multiple_blocks_preserve_order() {
        let first = PemData::create(vec![1, 2, 3], "FILE SIGNATURE").unwrap();
        let second = PemData::create(vec![4, 5, 6], "FILE SIGNATURE").unwrap();
        let text = format!("{}\n{}", first.to_block_string(), second.to_block_string());

        let parsed = parse_blocks(&text, &token()).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].data(), &[1, 2, 3]);
        assert_eq!(parsed[1].data(), &[4, 5, 6]);
    }

    #[test]
    fn surrounding_text_is_ignored() {
        let block = PemData::create(vec![9, 9], "FILE SIGNATURE").unwrap();
        let text = format!("preamble\n{}trailing commentary\n", block.to_block_string());
        let parsed = parse_blocks(&text, &token()).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn mismatched_end_label_fails() {
        let text = "-----BEGIN FILE SIGNATURE-----\nAQID\n-----END OTHER-----\n";
        assert!(matches!(
            parse_blocks(text, &token()),
            Err(SigningError::InvalidPemText(_))
        ));
    }

    #[test]
    fn missing_end_boundary_fails() {
        let text = "-----BEGIN FILE SIGNATURE-----\nAQID\n";
        assert!(parse_blocks(text, &token()).is_err());
    }

    #[test]
    fn garbage_inside_block_fails() {
        let text = "-----BEGIN FILE SIGNATURE-----\nnot*base64!\n-----END FILE SIGNATURE-----\n";
        assert!(matches!(
            parse_blocks(text, &token()),
            Err(SigningError::InvalidPemText("invalid base64 data"))
        ));
    }

    #[test]
    fn invalid_base64_grouping_fails() {
        let text = "-----BEGIN FILE SIGNATURE-----\nAQ=\n-----END FILE SIGNATURE-----\n";
        assert!(matches!(
            parse_blocks(text, &token()),
            Err(SigningError::InvalidBase64)
        ));
    }

    #[test]
    fn lowercase_label_is_rejected() {
        assert!(PemData::create(Vec::new(), "file signature").is_err());
    }

    #[test]
    fn cancelled_token_aborts_parsing() {
        let cancelled = CancellationToken::new();
        cancelled.cancel();
        let block = PemData::create(vec![1], "FILE SIGNATURE").unwrap();
        assert!(matches!(
            parse_blocks(&block.to_block_string(), &cancelled),
            Err(SigningError::OperationCancelled)
        ));
    }
}
