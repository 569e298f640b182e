//! Encapsulated PostScript, write-only: 8-bit gray or RGB images with
//! hex-encoded sample data. There is no reading EPS back.

use super::Format;
use crate::encoding::{self, NrrdEncoding};
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use std::io::Write;

/// The EPS container format.
#[derive(Debug)]
pub struct Eps;

impl Format for Eps {
    fn name(&self) -> &'static str {
        "eps"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["eps"]
    }

    fn fits(&self, nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        nrrd.ty == NrrdType::Uint8
            && (nrrd.dim() == 2 || (nrrd.dim() == 3 && nrrd.sizes()[0] == 3))
    }

    fn sniff(&self, _start: &[u8]) -> bool {
        false
    }

    fn read(
        &self,
        _src: &mut dyn DataInput,
        _nrrd: &mut Nrrd,
        _io: &mut NrrdIoState,
    ) -> Result<()> {
        Err(NrrdError::unsupported(
            "eps read: EPS is write-only".to_string(),
        ))
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "eps write";
        if !self.fits(nrrd, io) {
            return Err(NrrdError::unsupported(format!(
                "{}: only 8-bit gray or RGB arrays fit in EPS",
                me
            )));
        }
        let color = nrrd.dim() == 3;
        let sizes = nrrd.sizes();
        let (width, height) = if color {
            (sizes[1], sizes[2])
        } else {
            (sizes[0], sizes[1])
        };

        let mut header = String::new();
        header.push_str("%!PS-Adobe-3.0 EPSF-3.0\n");
        header.push_str(&format!(
            "%%Title: {}\n",
            nrrd.content.as_deref().unwrap_or("image")
        ));
        header.push_str("%%DocumentData: Clean7Bit\n");
        header.push_str("%%Pages: 1\n");
        header.push_str(&format!("%%BoundingBox: 0 0 {} {}\n", width, height));
        header.push_str("%%EndComments\n");
        header.push_str("gsave\n");
        header.push_str(&format!(
            "/pix {} string def\n",
            width * if color { 3 } else { 1 }
        ));
        header.push_str(&format!("{} {} scale\n", width, height));
        header.push_str(&format!(
            "{} {} 8 [{} 0 0 -{} 0 {}]\n",
            width, height, width, height, height
        ));
        header.push_str("{currentfile pix readhexstring pop}\n");
        if color {
            header.push_str("false 3 colorimage\n");
        } else {
            header.push_str("image\n");
        }
        util::write_all_chunked(dst, header.as_bytes(), me)?;

        encoding::Hex.write(dst, &nrrd.data, nrrd, io)?;

        util::write_all_chunked(dst, b"grestore\nshowpage\n%%EOF\n", me)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_image() {
        let nrrd = Nrrd::from_vec(vec![0u8, 128, 255, 64], &[2, 2]).unwrap();
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Eps.write(&mut bytes, &nrrd, &mut io).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("%!PS-Adobe-3.0 EPSF-3.0\n"));
        assert!(text.contains("%%BoundingBox: 0 0 2 2"));
        assert!(text.contains("image\n0080ff40\n"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn color_uses_colorimage() {
        let nrrd = Nrrd::from_vec(vec![1u8; 12], &[3, 2, 2]).unwrap();
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Eps.write(&mut bytes, &nrrd, &mut io).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("false 3 colorimage"));
    }

    #[test]
    fn no_reading_back() {
        let mut io = NrrdIoState::new();
        let mut nrrd = Nrrd::new();
        let mut src = crate::util::Unseekable(std::io::Cursor::new(Vec::new()));
        assert!(Eps.read(&mut src, &mut nrrd, &mut io).is_err());
    }

    #[test]
    fn wrong_shapes_rejected() {
        let nrrd = Nrrd::from_vec(vec![1.0f32; 4], &[2, 2]).unwrap();
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        assert!(Eps.write(&mut bytes, &nrrd, &mut io).is_err());
    }
}
