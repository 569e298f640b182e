//! PNM images: PGM (gray) and PPM (color), ascii and raw variants.
//! Holds 8-bit data only; array metadata beyond the image shape rides in
//! `#` comments as `field: value` lines.

use super::field;
use super::Format;
use crate::encoding::{self, NrrdEncoding};
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use std::io::Write;

/// The PNM container format.
#[derive(Debug)]
pub struct Pnm;

/// A PNM header token, or a comment line found on the way to one.
fn next_token_or_comment(src: &mut dyn DataInput) -> Result<Option<String>> {
    loop {
        {
            let buf = src.fill_buf()?;
            if buf.is_empty() {
                return Ok(None);
            }
            if buf[0] == b'#' {
                src.consume(1);
                let line = util::read_line(src)?.unwrap_or_default();
                return Ok(Some(format!("#{}", line)));
            }
            if buf[0].is_ascii_whitespace() {
                src.consume(1);
                continue;
            }
        }
        return util::next_token(src);
    }
}

fn header_int(
    src: &mut dyn DataInput,
    comments: &mut Vec<String>,
    what: &str,
) -> Result<usize> {
    let me = "pnm read";
    loop {
        let tok = next_token_or_comment(src)?.ok_or_else(|| {
            NrrdError::parse(format!("{}: hit end of input wanting {}", me, what))
        })?;
        if let Some(c) = tok.strip_prefix('#') {
            comments.push(c.trim().to_string());
            continue;
        }
        return tok.parse().map_err(|_| {
            NrrdError::parse(format!("{}: bad {} \"{}\"", me, what, tok))
        });
    }
}

impl Format for Pnm {
    fn name(&self) -> &'static str {
        "pnm"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["pnm", "pgm", "ppm"]
    }

    fn fits(&self, nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        nrrd.ty == NrrdType::Uint8
            && (nrrd.dim() == 2 || (nrrd.dim() == 3 && nrrd.sizes()[0] == 3))
    }

    fn sniff(&self, start: &[u8]) -> bool {
        start.len() >= 3
            && start[0] == b'P'
            && matches!(start[1], b'2' | b'3' | b'5' | b'6')
            && start[2].is_ascii_whitespace()
    }

    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "pnm read";
        *nrrd = Nrrd::new();

        let magic = util::next_token(src)?
            .ok_or_else(|| NrrdError::parse(format!("{}: empty input", me)))?;
        let (color, raw) = match magic.as_str() {
            "P2" => (false, false),
            "P3" => (true, false),
            "P5" => (false, true),
            "P6" => (true, true),
            other => {
                return Err(NrrdError::parse(format!(
                    "{}: \"{}\" is not a PNM magic this crate reads (P1/P4 bitmaps aren't supported)",
                    me, other
                )));
            }
        };

        let mut comments = Vec::new();
        let width = header_int(src, &mut comments, "width")?;
        let height = header_int(src, &mut comments, "height")?;
        let maxval = header_int(src, &mut comments, "maxval")?;
        if maxval == 0 || maxval > 255 {
            return Err(NrrdError::unsupported(format!(
                "{}: maxval {} outside [1,255]; only 8-bit images are supported",
                me, maxval
            )));
        }

        let sizes: Vec<usize> = if color {
            vec![3, width, height]
        } else {
            vec![width, height]
        };
        nrrd.ty = NrrdType::Uint8;
        nrrd.axes = sizes.iter().map(|&s| crate::axis::Axis::sized(s)).collect();
        let total = sizes
            .iter()
            .try_fold(1usize, |n, &s| n.checked_mul(s))
            .ok_or_else(|| {
                NrrdError::parse(format!("{}: image dimensions overflow", me))
            })?;
        let mut data = vec![0u8; total];

        io.encoding = if raw {
            // exactly one whitespace byte separates maxval from the pixels
            src.consume(1);
            &encoding::Raw as &'static dyn NrrdEncoding
        } else {
            &encoding::Ascii
        };
        io.encoding.read(src, &mut data, nrrd, io)?;
        nrrd.data = data;

        for c in comments {
            if !field::parse_comment_metadata(nrrd, io, &c)? {
                nrrd.comment_add(&c);
            }
        }
        nrrd.check()
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "pnm write";
        if !self.fits(nrrd, io) {
            return Err(NrrdError::unsupported(format!(
                "{}: only 8-bit gray or RGB arrays fit in PNM",
                me
            )));
        }
        let color = nrrd.dim() == 3;
        let ascii = io.encoding.is_text();
        let magic = match (color, ascii) {
            (false, false) => "P5",
            (true, false) => "P6",
            (false, true) => "P2",
            (true, true) => "P3",
        };
        let sizes = nrrd.sizes();
        let (width, height) = if color {
            (sizes[1], sizes[2])
        } else {
            (sizes[0], sizes[1])
        };

        let mut header = format!("{}\n", magic);
        for line in field::foreign_field_lines(nrrd, io) {
            header.push_str(&format!("# {}\n", line));
        }
        for c in &nrrd.comments {
            header.push_str(&format!("# {}\n", c));
        }
        header.push_str(&format!("{} {}\n255\n", width, height));
        util::write_all_chunked(dst, header.as_bytes(), me)?;

        let enc: &dyn NrrdEncoding = if ascii { &encoding::Ascii } else { &encoding::Raw };
        enc.write(dst, &nrrd.data, nrrd, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Unseekable;
    use std::io::Cursor;

    fn read_bytes(bytes: Vec<u8>) -> Result<(Nrrd, NrrdIoState)> {
        let mut io = NrrdIoState::new();
        let mut nrrd = Nrrd::new();
        let mut src = Unseekable(Cursor::new(bytes));
        Pnm.read(&mut src, &mut nrrd, &mut io)?;
        Ok((nrrd, io))
    }

    #[test]
    fn ascii_gray() {
        let (nrrd, _) = read_bytes(
            b"P2\n# brightness map\n3 2\n255\n0 10 20\n30 40 50\n".to_vec(),
        )
        .unwrap();
        assert_eq!(nrrd.ty, NrrdType::Uint8);
        assert_eq!(nrrd.sizes(), vec![3, 2]);
        assert_eq!(nrrd.values::<u8>().unwrap(), vec![0, 10, 20, 30, 40, 50]);
        assert_eq!(nrrd.comments, vec!["brightness map".to_string()]);
    }

    #[test]
    fn raw_color_with_metadata_comments() {
        let mut bytes = b"P6\n# spacings: nan 2 3\n2 1\n255\n".to_vec();
        bytes.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let (nrrd, _) = read_bytes(bytes).unwrap();
        assert_eq!(nrrd.sizes(), vec![3, 2, 1]);
        assert_eq!(nrrd.values::<u8>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert!(!crate::fp::exists(nrrd.axes[0].spacing));
        assert_eq!(nrrd.axes[1].spacing, 2.0);
        assert!(nrrd.comments.is_empty());
    }

    #[test]
    fn round_trip_gray() {
        let mut nrrd = Nrrd::from_vec(vec![9u8, 8, 7, 6], &[2, 2]).unwrap();
        nrrd.axes[0].spacing = 1.5;
        nrrd.axes[1].spacing = 2.5;
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Pnm.write(&mut bytes, &nrrd, &mut io).unwrap();
        assert!(bytes.starts_with(b"P5\n"));

        let (back, _) = read_bytes(bytes).unwrap();
        assert_eq!(back.values::<u8>().unwrap(), vec![9, 8, 7, 6]);
        assert_eq!(back.axes[0].spacing, 1.5);
        assert_eq!(back.axes[1].spacing, 2.5);
    }

    #[test]
    fn rejects_wide_samples() {
        assert!(read_bytes(b"P2\n1 1\n65535\n99\n".to_vec()).is_err());
    }

    #[test]
    fn fit_rules() {
        let io = NrrdIoState::new();
        assert!(Pnm.fits(&Nrrd::from_vec(vec![0u8; 6], &[3, 2]).unwrap(), &io));
        assert!(Pnm.fits(&Nrrd::from_vec(vec![0u8; 6], &[3, 2, 1]).unwrap(), &io));
        assert!(!Pnm.fits(&Nrrd::from_vec(vec![0u8; 6], &[2, 3, 1]).unwrap(), &io));
        assert!(!Pnm.fits(&Nrrd::from_vec(vec![0u16; 6], &[3, 2]).unwrap(), &io));
    }
}
