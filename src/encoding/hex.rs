//! Hex encoding: two hexadecimal digits per byte, whitespace ignored.

use super::NrrdEncoding;
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::{self, DataInput};
use std::io::Write;

/// The `hex` encoding.
#[derive(Debug)]
pub struct Hex;

fn nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

impl NrrdEncoding for Hex {
    fn name(&self) -> &'static str {
        "hex"
    }

    fn is_compression(&self) -> bool {
        false
    }

    fn read(
        &self,
        src: &mut dyn DataInput,
        data: &mut [u8],
        nrrd: &Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        let me = "hex read";
        let total = data.len();
        let elsize = nrrd.element_size().max(1);
        let mut filled = 0;
        // high nibble of the byte under construction, when half-read
        let mut high: Option<u8> = None;
        'outer: loop {
            let (used, full) = {
                let buf = src.fill_buf()?;
                if buf.is_empty() {
                    break 'outer;
                }
                let mut used = 0;
                let mut full = false;
                for &b in buf {
                    used += 1;
                    if b.is_ascii_whitespace() {
                        continue;
                    }
                    let n = nibble(b).ok_or_else(|| {
                        NrrdError::parse(format!(
                            "{}: '{}' (0x{:02x}) is not a hex digit",
                            me, b as char, b
                        ))
                    })?;
                    match high.take() {
                        None => high = Some(n),
                        Some(h) => {
                            data[filled] = (h << 4) | n;
                            filled += 1;
                            if filled == total {
                                full = true;
                                break;
                            }
                        }
                    }
                }
                (used, full)
            };
            src.consume(used);
            if full {
                break;
            }
        }
        if filled < total {
            return Err(NrrdError::short_read(me, filled / elsize, total / elsize));
        }
        Ok(())
    }

    fn write(
        &self,
        dst: &mut dyn Write,
        data: &[u8],
        _nrrd: &Nrrd,
        io: &NrrdIoState,
    ) -> Result<()> {
        let me = "hex write";
        let bytes_per_line = (io.chars_per_line / 2).max(1);
        let mut line = Vec::with_capacity(2 * bytes_per_line + 1);
        for chunk in data.chunks(bytes_per_line) {
            line.clear();
            for &b in chunk {
                line.push(HEX_DIGITS[(b >> 4) as usize]);
                line.push(HEX_DIGITS[(b & 0x0F) as usize]);
            }
            line.push(b'\n');
            util::write_all_chunked(dst, &line, me)?;
        }
        Ok(())
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
        let nrrd = Nrrd::from_vec(vec![0u8, 15, 16, 255, 171], &[5]).unwrap();
        let mut io = NrrdIoState::default();

        let mut text = Vec::new();
        Hex.write(&mut text, &nrrd.data, &nrrd, &io).unwrap();
        assert_eq!(String::from_utf8(text.clone()).unwrap(), "000f10ffab\n");

        let mut buf = vec![0u8; 5];
        let mut src = Unseekable(Cursor::new(text));
        Hex.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        assert_eq!(buf, vec![0, 15, 16, 255, 171]);
    }

    #[test]
    fn whitespace_between_digits() {
        let nrrd = Nrrd::alloc(NrrdType::Uint8, &[3]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 3];
        let mut src = Unseekable(Cursor::new(b"0 1\n2 3  Ff".to_vec()));
        Hex.read(&mut src, &mut buf, &nrrd, &mut io).unwrap();
        assert_eq!(buf, vec![0x01, 0x23, 0xFF]);
    }

    #[test]
    fn rejects_non_hex() {
        let nrrd = Nrrd::alloc(NrrdType::Uint8, &[2]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 2];
        let mut src = Unseekable(Cursor::new(b"0xZZ".to_vec()));
        assert!(Hex.read(&mut src, &mut buf, &nrrd, &mut io).is_err());
    }

    #[test]
    fn short_input() {
        let nrrd = Nrrd::alloc(NrrdType::Uint16, &[4]).unwrap();
        let mut io = NrrdIoState::default();
        let mut buf = vec![0u8; 8];
        let mut src = Unseekable(Cursor::new(b"00112233".to_vec()));
        let err = Hex.read(&mut src, &mut buf, &nrrd, &mut io).unwrap_err();
        assert_eq!(format!("{}", err), "got only 2 of 4 elements");
    }
}
