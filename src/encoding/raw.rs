//! Raw encoding: element bytes verbatim.

use super::NrrdEncoding;
use crate::error::Result;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::{self, DataInput};
use std::io::Write;

/// The `raw` encoding.
#[derive(Debug)]
pub struct Raw;

impl NrrdEncoding for Raw {
    fn name(&self) -> &'static str {
        "raw"
    }

    fn is_compression(&self) -> bool {
        false
    }

    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        io: &mut NrrdIoState,
    ) -> Result<()> {
        util::read_exact_chunked(src, data, nrrd.element_size(), "raw read")?;
        if !src.fill_buf()?.is_empty() {
            io.warn("raw read: more data in file past the payload");
        }
        Ok(())
    }

    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        _nrrd: &Nrrd,
        _io: &NrrdIoState,
    ) -> Result<()> {
        util::write_all_chunked(dst, data, "raw write")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typedef::NrrdType;
    use crate::util::Unseekable;
    use std::io::Cursor;

    #[test]
    fn round_trip() {
        let nrrd = Nrrd::from_vec(vec![1u16, 2, 3, 4, 5, 6], &[3, 2]).unwrap();
        let mut io = NrrdIoState::default();

        let mut bytes = Vec::new();
        Raw.write(&mut bytes, &nrrd.data, &nrrd, &io).unwrap();
        assert_eq!(bytes.len(), 12);

        let mut back = Nrrd::alloc(NrrdType::Uint16, &[3, 2]).unwrap();
        let mut src = Unseekable(Cursor::new(bytes));
        let mut buf = std::mem::take(&mut back.data);
        Raw.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        back.data = buf;
        assert_eq!(back.values::<u16>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn trailing_data_warns() {
        let nrrd = Nrrd::from_vec(vec![1u8, 2], &[2]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 2];
        let mut src = Unseekable(Cursor::new(vec![1u8, 2, 3]));
        Raw.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        assert_eq!(buf, vec![1, 2]);
        assert!(io.warnings.iter().any(|w| w.contains("past the payload")));
    }

    #[test]
    fn truncated_payload() {
        let nrrd = Nrrd::from_vec(vec![1u32, 2, 3, 4], &[4]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 16];
        let mut src = Unseekable(Cursor::new(vec![0u8; 10]));
        let err = Raw
            .read(&mut src, &mut buf, &nrrd, &mut io)
            .unwrap_err();
        assert_eq!(format!("{}", err), "got only 2 of 4 elements");
    }
}
