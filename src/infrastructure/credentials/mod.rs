//! Private key handling
//!
//! - PEM cleanup for values pasted into env files and secret stores
//! - PEM / DER / base64 decoding into canonical PKCS#8 DER
//! - Passphrase handling with a single unencrypted-key retry

pub mod decoder;
pub mod normalizer;

pub use decoder::{
    decode_base64, decode_key_material, decode_pem, is_encrypted_pem, looks_like_pem,
    DecodeFailure,
};
pub use normalizer::{normalize_pem, unescape_newlines};
