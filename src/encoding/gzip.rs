//! Gzip encoding, via flate2.

use super::NrrdEncoding;
use crate::error::Result;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::{self, DataInput};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;

/// The `gzip` encoding.
#[derive(Debug)]
pub struct Gzip;

impl NrrdEncoding for Gzip {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn suffix(&self) -> &'static str {
        "raw.gz"
    }

    fn is_compression(&self) -> bool {
        true
    }

    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        let mut dec = GzDecoder::new(&mut *src);
        util::read_exact_chunked(&mut dec, data, nrrd.element_size(), "gzip read")
    }

    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        _nrrd: &Nrrd,
        io: &NrrdIoState,
    ) -> Result<()> {
        let level = match io.zlib_level {
            Some(l) => Compression::new(l.min(9)),
            None => Compression::default(),
        };
        let mut enc = GzEncoder::new(&mut *dst, level);
        util::write_all_chunked(&mut enc, data, "gzip write")?;
        enc.finish()?;
        Ok(())
    }
}
