//! Serialized script format.
//!
//! ```text
//! magic "NJSB" | version: u32 LE | source fingerprint: u64 LE | JSON syntax tree
//! ```

use std::hash::Hasher;

use rustc_hash::FxHasher;
use thiserror::Error;

use super::ast::Program;

const MAGIC: &[u8; 4] = b"NJSB";
const FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("serialized script is truncated")]
    Truncated,
    #[error("bad magic in serialized script")]
    BadMagic,
    #[error("unsupported serialized script version {0}")]
    UnsupportedVersion(u32),
    #[error("malformed syntax tree: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded script; `program` is `None` when it was compiled from other source.
pub(crate) struct Decoded {
    pub(crate) program: Option<Program>,
}

pub(crate) fn fingerprint(source: &str) -> u64 {
    let mut hasher = FxHasher::default();
    hasher.write(source.as_bytes());
    hasher.write_usize(source.len());
    hasher.finish()
}

pub(crate) fn encode(source: &str, program: &Program) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(HEADER_LEN + source.len() * 2);
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&fingerprint(source).to_le_bytes());
    serde_json::to_writer(&mut out, program)?;
    Ok(out)
}

/// Validate the header and decode the tree when it belongs to `source`.
pub(crate) fn decode(bytes: &[u8], source: &str) -> Result<Decoded, CodecError> {
    let header = bytes.get(..HEADER_LEN).ok_or(CodecError::Truncated)?;
    let (magic, rest) = header.split_at(4);
    if magic != MAGIC {
        return Err(CodecError::BadMagic);
    }
    let (version, stamp) = rest.split_at(4);
    let version = u32::from_le_bytes(version.try_into().map_err(|_| CodecError::Truncated)?);
    if version != FORMAT_VERSION {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let stamp = u64::from_le_bytes(stamp.try_into().map_err(|_| CodecError::Truncated)?);
    if stamp != fingerprint(source) {
        tracing::debug!("serialized script does not match its source; recompiling");
        return Ok(Decoded { program: None });
    }
    let program = serde_json::from_slice(&bytes[HEADER_LEN..])?;
    Ok(Decoded {
        program: Some(program),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::parser::parse_program;

    #[test]
    fn test_header_layout() {
        let program = parse_program("1 + 2").expect("parses");
        let bytes = encode("1 + 2", &program).expect("encodes");
        assert_eq!(&bytes[..4], b"NJSB");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &fingerprint("1 + 2").to_le_bytes());
    }

    #[test]
    fn test_decode_matching_source() {
        let program = parse_program("var a = 1; a").expect("parses");
        let bytes = encode("var a = 1; a", &program).expect("encodes");
        let decoded = decode(&bytes, "var a = 1; a").expect("decodes");
        assert_eq!(decoded.program.map(|p| p.body.len()), Some(2));
    }

    #[test]
    fn test_decode_other_source_recompiles() {
        let program = parse_program("1").expect("parses");
        let bytes = encode("1", &program).expect("encodes");
        let decoded = decode(&bytes, "2").expect("header is valid");
        assert!(decoded.program.is_none());
    }

    #[test]
    fn test_bad_header() {
        assert!(matches!(decode(b"NJS", "1"), Err(CodecError::Truncated)));
        assert!(matches!(
            decode(b"XXXX\x01\0\0\0\0\0\0\0\0\0\0\0", "1"),
            Err(CodecError::BadMagic)
        ));
        let mut bytes = b"NJSB".to_vec();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&fingerprint("1").to_le_bytes());
        assert!(matches!(
            decode(&bytes, "1"),
            Err(CodecError::UnsupportedVersion(7))
        ));
    }
}
