//! ASN.1 BER/DER tag-length-value model and codec.
//!
//! The encoding rules distinguish three encoding forms: primitive with
//! definite length, constructed with definite length, and constructed with
//! indefinite length. DER is the strict subset that permits only definite
//! lengths with the canonical shortest representation; BER permits all
//! three forms. Rather than a parallel BER/DER type hierarchy, a single
//! [`TlvValue`] carries the observed [`EncodingForm`], and strictness is a
//! property of that field.

pub mod reader;
pub mod writer;

pub use reader::ByteReader;

use crate::infra::error::{SigningError, SigningResult};

/// Universal tag numbers. All tags used by this format fit in 5 bits, so
/// multi-byte identifier octets never occur.
pub mod tag {
    pub const INTEGER: u8 = 0x02;
    pub const OCTET_STRING: u8 = 0x04;
    pub const OBJECT_IDENTIFIER: u8 = 0x06;
    pub const UTF8_STRING: u8 = 0x0C;
    pub const SEQUENCE: u8 = 0x10;
    pub const PRINTABLE_STRING: u8 = 0x13;
    pub const T61_STRING: u8 = 0x14;
    pub const IA5_STRING: u8 = 0x16;
    pub const VISIBLE_STRING: u8 = 0x1A;
    pub const UNIVERSAL_STRING: u8 = 0x1C;
    pub const BMP_STRING: u8 = 0x1E;
}

/// Bit 6 of the identifier octet: constructed encoding.
pub const CONSTRUCTED_FLAG: u8 = 0x20;

/// Low five bits of the identifier octet: the tag number.
pub const TAG_MASK: u8 = 0x1F;

/// Tag class, bits 7-8 of the identifier octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Universal = 0,
    Application = 1,
    ContextSpecific = 2,
    Private = 3,
}

impl Class {
    /// Extract the class from an identifier octet.
    #[must_use]
    pub fn from_identifier(identifier: u8) -> Self {
        match identifier >> 6 {
            3 => Class::Private,
            2 => Class::ContextSpecific,
            1 => Class::Application,
            _ => Class::Universal,
        }
    }
}

/// The encoding form observed in (or requested for) a value.
///
/// `PrimitiveDefinite` with canonical length is the only scalar form DER
/// permits; `ConstructedDefinite` covers DER sequences; indefinite length is
/// BER-only and legal only for constructed encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingForm {
    PrimitiveDefinite,
    ConstructedDefinite,
    ConstructedIndefinite,
}

impl EncodingForm {
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        !matches!(self, EncodingForm::PrimitiveDefinite)
    }

    #[must_use]
    pub fn is_definite(&self) -> bool {
        !matches!(self, EncodingForm::ConstructedIndefinite)
    }
}

/// An ASN.1 integer held as its minimal two's-complement big-endian content
/// bytes. Values wider than 64 bits survive decode/re-encode untouched; the
/// schema layer converts to native integers only where it range-checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asn1Integer {
    content: Vec<u8>,
}

impl Asn1Integer {
    /// Build from a native integer using the minimal two's-complement
    /// representation (a single extra 0x00 or 0xFF byte only when required
    /// to keep the sign bit unambiguous).
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self {
            content: writer::encode_twos_complement(value),
        }
    }

    /// Wrap raw content bytes exactly as observed in the stream.
    #[must_use]
    pub fn from_content(content: Vec<u8>) -> Self {
        Self { content }
    }

    /// Interpret the content as a signed big-endian integer. Returns `None`
    /// when the value does not fit in 64 bits.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        reader::decode_twos_complement(&self.content)
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }
}

/// A single tag-length-value node.
///
/// For primitive values `content` is the literal payload; for constructed
/// values it is the concatenated encoding of the children. For
/// constructed-indefinite values built by [`TlvValue::octet_string`] /
/// [`TlvValue::utf8_string`], the two end-of-contents octets are part of
/// `content`, matching the bytes that follow the `0x80` length octet on the
/// wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlvValue {
    class: Class,
    tag: u8,
    form: EncodingForm,
    content: Vec<u8>,
}

impl TlvValue {
    /// Build a value from its semantic fields.
    ///
    /// Fails when the tag number does not fit in the single-byte identifier
    /// format, or when indefinite length is requested for a primitive
    /// encoding.
    pub fn new(
        class: Class,
        tag: u8,
        form: EncodingForm,
        content: Vec<u8>,
    ) -> SigningResult<Self> {
        // 0x1F in the low five bits marks a multi-byte tag, so the largest
        // single-byte tag number is 30.
        if tag >= TAG_MASK {
            return Err(SigningError::MalformedEncoding { expected_tag: tag });
        }
        Ok(Self {
            class,
            tag,
            form,
            content,
        })
    }

    /// INTEGER with primitive definite-length encoding.
    #[must_use]
    pub fn integer(value: &Asn1Integer) -> Self {
        Self {
            class: Class::Universal,
            tag: tag::INTEGER,
            form: EncodingForm::PrimitiveDefinite,
            content: value.content().to_vec(),
        }
    }

    /// OCTET STRING in the requested encoding form.
    #[must_use]
    pub fn octet_string(value: &[u8], form: EncodingForm) -> Self {
        Self {
            class: Class::Universal,
            tag: tag::OCTET_STRING,
            form,
            content: content_for_form(value.to_vec(), form),
        }
    }

    /// OBJECT IDENTIFIER from a dotted-decimal string.
    pub fn object_identifier(oid: &str) -> SigningResult<Self> {
        Ok(Self {
            class: Class::Universal,
            tag: tag::OBJECT_IDENTIFIER,
            form: EncodingForm::PrimitiveDefinite,
            content: writer::encode_oid(oid)?,
        })
    }

    /// UTF8String in the requested encoding form.
    #[must_use]
    pub fn utf8_string(value: &str, form: EncodingForm) -> Self {
        Self {
            class: Class::Universal,
            tag: tag::UTF8_STRING,
            form,
            content: content_for_form(value.as_bytes().to_vec(), form),
        }
    }

    /// SEQUENCE of child values, constructed definite-length.
    #[must_use]
    pub fn sequence(elements: &[TlvValue]) -> Self {
        let mut content = Vec::new();
        for element in elements {
            element.encode_into(&mut content);
        }
        Self {
            class: Class::Universal,
            tag: tag::SEQUENCE,
            form: EncodingForm::ConstructedDefinite,
            content,
        }
    }

    /// The identifier octet: `(class << 6) | constructed-bit | tag`.
    #[must_use]
    pub fn identifier_octet(&self) -> u8 {
        let constructed = if self.form.is_constructed() {
            CONSTRUCTED_FLAG
        } else {
            0
        };
        ((self.class as u8) << 6) | constructed | self.tag
    }

    #[must_use]
    pub fn class(&self) -> Class {
        self.class
    }

    #[must_use]
    pub fn tag(&self) -> u8 {
        self.tag
    }

    #[must_use]
    pub fn form(&self) -> EncodingForm {
        self.form
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Append the full identifier-length-content encoding to `out`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.push(self.identifier_octet());
        match self.form {
            EncodingForm::ConstructedIndefinite => writer::write_indefinite_length(out),
            _ => writer::write_length(out, self.content.len()),
        }
        out.extend_from_slice(&self.content);
    }

    /// Encode to a fresh byte vector.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.content.len() + 4);
        self.encode_into(&mut out);
        out
    }
}

/// Indefinite-length content carries its own end-of-contents octets.
fn content_for_form(mut value: Vec<u8>, form: EncodingForm) -> Vec<u8> {
    if form == EncodingForm::ConstructedIndefinite {
        value.extend_from_slice(&[0x00, 0x00]);
    }
    value
}
