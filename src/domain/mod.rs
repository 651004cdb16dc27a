//! Domain layer: pure data types and codecs with no I/O.

pub mod asn1;
pub mod constants;
pub mod file_name;
pub mod identity;
pub mod targets;
