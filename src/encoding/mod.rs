//! Payload encodings: how the element values become bytes after the
//! header. Each encoding is a stateless singleton implementing
//! [`NrrdEncoding`]; [`from_name`] resolves the `encoding:` header field.

use crate::error::Result;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::DataInput;
use std::io::Write;

mod ascii;
mod bzip2;
mod gzip;
mod hex;
mod raw;

pub use self::ascii::Ascii;
pub use self::bzip2::Bzip2;
pub use self::gzip::Gzip;
pub use self::hex::Hex;
pub use self::raw::Raw;

/// One way of translating between element values and payload bytes.
///
/// `read` fills `data` (one whole payload, or one slab of a multi-file
/// payload) from `src`; `write` is its inverse. Byte-order fixups are
/// the caller's job, not the encoding's.
pub trait NrrdEncoding: Sync {
    /// The `encoding:` field value this encoding writes.
    fn name(&self) -> &'static str;

    /// Extension given to a detached data file holding this encoding.
    fn suffix(&self) -> &'static str {
        self.name()
    }

    /// Whether the payload is a compressed byte stream. Compressed
    /// payloads cannot be byte-skipped into.
    fn is_compression(&self) -> bool;

    /// Whether support was compiled in.
    fn available(&self) -> bool {
        true
    }

    /// Whether values are stored as printed numbers rather than element
    /// bytes. Such payloads have no byte order and can't hold blocks.
    fn is_text(&self) -> bool {
        false
    }

    /// Fill `data` from `src`.
    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        io: &mut NrrdIoState,
    ) -> Result<()>;

    /// Write `data` to `dst`.
    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        nrrd: &Nrrd,
        io: &NrrdIoState,
    ) -> Result<()>;
}

/// Every encoding, in the order the `encoding:` field is matched.
pub static ENCODINGS: [&(dyn NrrdEncoding); 5] = [&Raw, &Ascii, &Hex, &Gzip, &Bzip2];

/// Resolve an `encoding:` field value, accepting the historical aliases.
pub fn from_name(name: &str) -> Option<&'static dyn NrrdEncoding> {
    match name.trim().to_ascii_lowercase().as_str() {
        "raw" => Some(&Raw),
        "ascii" | "txt" | "text" => Some(&Ascii),
        "hex" => Some(&Hex),
        "gz" | "gzip" => Some(&Gzip),
        "bz2" | "bzip2" => Some(&Bzip2),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup() {
        assert_eq!(from_name("raw").unwrap().name(), "raw");
        assert_eq!(from_name("txt").unwrap().name(), "ascii");
        assert_eq!(from_name(" GZIP ").unwrap().name(), "gzip");
        assert_eq!(from_name("bz2").unwrap().name(), "bzip2");
        assert!(from_name("lzma").is_none());
    }

    #[test]
    fn compression_flags() {
        assert!(!Raw.is_compression());
        assert!(!Ascii.is_compression());
        assert!(!Hex.is_compression());
        assert!(Gzip.is_compression());
        assert!(Bzip2.is_compression());
        assert!(Ascii.is_text());
        assert!(!Raw.is_text());
        // hex stores element bytes, so byte order still matters
        assert!(!Hex.is_text());
    }

    #[test]
    fn detached_suffixes() {
        assert_eq!(Raw.suffix(), "raw");
        assert_eq!(Ascii.suffix(), "ascii");
        assert_eq!(Hex.suffix(), "hex");
        assert_eq!(Gzip.suffix(), "raw.gz");
        assert_eq!(Bzip2.suffix(), "raw.bz2");
    }
}
