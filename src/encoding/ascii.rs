//! Ascii encoding: whitespace-separated printed values.

use super::NrrdEncoding;
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use std::io::Write;

/// The `ascii` encoding.
#[derive(Debug)]
pub struct Ascii;

impl NrrdEncoding for Ascii {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn is_compression(&self) -> bool {
        false
    }

    fn is_text(&self) -> bool {
        true
    }

    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        let me = "ascii read";
        if nrrd.ty == NrrdType::Block {
            return Err(NrrdError::unsupported(format!(
                "{}: can't be used on block-type data",
                me
            )));
        }
        let elsize = nrrd.element_size();
        let count = data.len() / elsize;
        let mut parsed = Vec::with_capacity(data.len());
        for i in 0..count {
            let tok = util::next_token(src)?
                .ok_or_else(|| NrrdError::short_read(me, i, count))?;
            nrrd.ty.parse_value(&tok, &mut parsed)?;
        }
        data.copy_from_slice(&parsed);
        Ok(())
    }

    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        nrrd: &Nrrd,
        io: &NrrdIoState,
    ) -> Result<()> {
        let me = "ascii write";
        if nrrd.ty == NrrdType::Block {
            return Err(NrrdError::unsupported(format!(
                "{}: can't be used on block-type data",
                me
            )));
        }
        let count = data.len() / nrrd.element_size();
        // 2-D arrays get one scanline of values per text line; everything
        // else wraps at the configured line width
        let per_line = if nrrd.dim() == 2 {
            nrrd.sizes()[0]
        } else {
            (io.chars_per_line / (nrrd.ty.max_print_width() + 1)).max(1)
        };
        let mut line = String::new();
        for i in 0..count {
            let tok = nrrd.ty.format_value(data, i)?;
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(&tok);
            if (i + 1) % per_line == 0 {
                line.push('\n');
                util::write_all_chunked(dst, line.as_bytes(), me)?;
                line.clear();
            }
        }
        if !line.is_empty() {
            line.push('\n');
            util::write_all_chunked(dst, line.as_bytes(), me)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Unseekable;
    use std::io::Cursor;

    #[test]
    fn round_trip_floats() {
        let nrrd =
            Nrrd::from_vec(vec![1.5f32, -2.0, f32::NAN, f32::INFINITY], &[2, 2]).unwrap();
        let mut io = NrrdIoState::default();

        let mut text = Vec::new();
        Ascii.write(&mut text, &nrrd.data, &nrrd, &io).unwrap();
        let s = String::from_utf8(text.clone()).unwrap();
        assert_eq!(s, "1.5 -2\nnan inf\n");

        let mut buf = vec![0u8; nrrd.data.len()];
        let mut src = Unseekable(Cursor::new(text));
        Ascii.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        let back = Nrrd::wrap(buf, NrrdType::Float, &[2, 2]).unwrap();
        let vals = back.values::<f32>().unwrap();
        assert_eq!(vals[0], 1.5);
        assert_eq!(vals[1], -2.0);
        assert!(vals[2].is_nan());
        assert_eq!(vals[3], f32::INFINITY);
    }

    #[test]
    fn tolerates_arbitrary_whitespace() {
        let nrrd = Nrrd::alloc(NrrdType::Int32, &[5]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; nrrd.data.len()];
        let mut src = Unseekable(Cursor::new(b"  1\t2\n\n3   4\r\n5 ".to_vec()));
        Ascii.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        let back = Nrrd::wrap(buf, NrrdType::Int32, &[5]).unwrap();
        assert_eq!(back.values::<i32>().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn too_few_tokens() {
        let nrrd = Nrrd::alloc(NrrdType::Uint8, &[4]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 4];
        let mut src = Unseekable(Cursor::new(b"10 20".to_vec()));
        let err = Ascii.read(&mut src, &mut buf, &nrrd, &mut io).unwrap_err();
        assert_eq!(format!("{}", err), "got only 2 of 4 elements");
    }

    #[test]
    fn rejects_blocks() {
        let nrrd = Nrrd::alloc_block(8, &[2]).unwrap();
        let io = NrrdIoState::default();
        let mut out = Vec::new();
        assert!(Ascii.write(&mut out, &nrrd.data, &nrrd, &io).is_err());
    }
}
