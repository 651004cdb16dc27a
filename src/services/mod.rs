//! Service layer: signing pipeline, signature assembly, and the detached
//! file formats, over collaborator traits for the cryptographic backend.

pub mod collaborators;
pub mod file_format;
pub mod pem;
pub mod signature;
pub mod signing;
