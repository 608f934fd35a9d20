//! Decoding of the `unoinfo` helper's standard output.
//!
//! The helper writes one sentinel byte followed by a payload of NUL-separated
//! resource location strings:
//!
//! | sentinel | payload encoding                      |
//! |----------|---------------------------------------|
//! | `'0'`    | native bytes (the helper's locale)     |
//! | `'1'`    | UTF-16, little endian                  |
//!
//! Narrow fields become paths byte for byte on unix. Elsewhere, and in the
//! text view returned by [`Envelope::decode`], each byte is one ISO-8859-1
//! character.
//!
//! Anything else, including an empty stream, is an invalid envelope and
//! contributes no locations.

use std::path::PathBuf;

use thiserror::Error;

/// Sentinel for the single-byte payload encoding.
pub const NARROW_SENTINEL: u8 = b'0';
/// Sentinel for the UTF-16LE payload encoding.
pub const WIDE_SENTINEL: u8 = b'1';
/// Separator between payload fields.
pub const FIELD_SEPARATOR: char = '\0';

/// Errors raised while decoding an envelope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    /// The output was empty or started with an unknown sentinel.
    #[error("bad unoinfo output: {0}")]
    InvalidSentinel(String),

    /// A wide payload had an odd number of bytes.
    #[error("wide unoinfo output has odd length {0}")]
    OddLength(usize),

    /// A wide payload contained an unpaired surrogate.
    #[error("wide unoinfo output is not valid UTF-16: {0}")]
    InvalidUtf16(String),
}

/// Helper output split into its sentinel-selected encoding and payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope<'a> {
    /// Payload in the helper's native byte encoding.
    Narrow(&'a [u8]),
    /// Payload encoded as little-endian UTF-16.
    Wide(&'a [u8]),
    /// No sentinel, or a sentinel that names no known encoding.
    Invalid(Option<u8>),
}

impl<'a> Envelope<'a> {
    /// Classify raw helper output by its leading sentinel byte.
    pub fn parse(output: &'a [u8]) -> Self {
        match output.split_first() {
            Some((&NARROW_SENTINEL, payload)) => Self::Narrow(payload),
            Some((&WIDE_SENTINEL, payload)) => Self::Wide(payload),
            Some((&other, _)) => Self::Invalid(Some(other)),
            None => Self::Invalid(None),
        }
    }

    /// Decode the payload into text, one character per narrow byte.
    pub fn decode(self) -> Result<String, EnvelopeError> {
        match self {
            Self::Narrow(payload) => Ok(payload.iter().map(|&b| char::from(b)).collect()),
            Self::Wide(payload) => decode_utf16le(payload),
            Self::Invalid(Some(byte)) => Err(EnvelopeError::InvalidSentinel(format!(
                "unknown sentinel byte {byte:#04x}"
            ))),
            Self::Invalid(None) => Err(EnvelopeError::InvalidSentinel("no output".to_string())),
        }
    }

    /// Decode the payload and split it into its non-empty fields.
    pub fn fields(self) -> Result<Vec<String>, EnvelopeError> {
        let text = self.decode()?;
        Ok(split_fields(&text))
    }

    /// Split the payload into its non-empty fields as filesystem paths.
    pub fn path_fields(self) -> Result<Vec<PathBuf>, EnvelopeError> {
        match self {
            Self::Narrow(payload) => Ok(payload
                .split(|&b| b == 0)
                .filter(|field| !field.is_empty())
                .map(narrow_path)
                .collect()),
            other => Ok(other.fields()?.into_iter().map(PathBuf::from).collect()),
        }
    }
}

#[cfg(unix)]
fn narrow_path(field: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(field))
}

#[cfg(not(unix))]
fn narrow_path(field: &[u8]) -> PathBuf {
    PathBuf::from(field.iter().map(|&b| char::from(b)).collect::<String>())
}

fn decode_utf16le(payload: &[u8]) -> Result<String, EnvelopeError> {
    if payload.len() % 2 != 0 {
        return Err(EnvelopeError::OddLength(payload.len()));
    }
    let units = payload
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| EnvelopeError::InvalidUtf16(e.to_string()))
}

/// Split decoded text on NUL separators, dropping empty fields.
pub fn split_fields(text: &str) -> Vec<String> {
    text.split(FIELD_SEPARATOR)
        .filter(|field| !field.is_empty())
        .map(str::to_string)
        .collect()
}

/// Build a well-formed narrow envelope from raw field bytes.
pub fn encode_narrow<S: AsRef<[u8]>>(fields: &[S]) -> Vec<u8> {
    let mut out = vec![NARROW_SENTINEL];
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(0);
        }
        out.extend_from_slice(field.as_ref());
    }
    out
}

/// Build a well-formed wide envelope.
pub fn encode_wide<S: AsRef<str>>(fields: &[S]) -> Vec<u8> {
    let joined = fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("\0");
    let mut out = vec![WIDE_SENTINEL];
    out.extend(joined.encode_utf16().flat_map(u16::to_le_bytes));
    out
}
