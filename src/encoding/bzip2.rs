//! Bzip2 encoding, compiled in with the `bzip2` feature.

use super::NrrdEncoding;
use crate::error::Result;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::DataInput;
use std::io::Write;

#[cfg(not(feature = "bzip2"))]
use crate::error::NrrdError;

/// The `bzip2` encoding.
#[derive(Debug)]
pub struct Bzip2;

impl NrrdEncoding for Bzip2 {
    fn name(&self) -> &'static str {
        "bzip2"
    }

    fn suffix(&self) -> &'static str {
        "raw.bz2"
    }

    fn is_compression(&self) -> bool {
        true
    }

    fn available(&self) -> bool {
        cfg!(feature = "bzip2")
    }

    #[cfg(feature = "bzip2")]
    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        let mut dec = ::bzip2::read::BzDecoder::new(&mut *src);
        crate::util::read_exact_chunked(&mut dec, data, nrrd.element_size(), "bzip2 read")
    }

    #[cfg(not(feature = "bzip2"))]
    fn read(
        &self,
        _src: &mut dyn DataInput,
        _data: &mut [u8],
        _nrrd: &Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        Err(NrrdError::unavailable("bzip2 read", "bzip2 encoding"))
    }

    #[cfg(feature = "bzip2")]
    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        _nrrd: &Nrrd,
        io: &NrrdIoState,
    ) -> Result<()> {
        let level = match io.bzip2_block_size {
            Some(b) => ::bzip2::Compression::new(b.clamp(1, 9)),
            None => ::bzip2::Compression::default(),
        };
        let mut enc = ::bzip2::write::BzEncoder::new(&mut *dst, level);
        crate::util::write_all_chunked(&mut enc, data, "bzip2 write")?;
        enc.finish()?;
        Ok(())
    }

    #[cfg(not(feature = "bzip2"))]
    fn write(
        &self,
        _dst: &mut dyn Write,
        _data: &[u8],
        _nrrd: &Nrrd,
        _io: &NrrdIoState,
    ) -> Result<()> {
        Err(NrrdError::unavailable("bzip2 write", "bzip2 encoding"))
    }
}
