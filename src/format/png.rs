//! PNG images: 8- and 16-bit gray, gray-alpha, RGB and RGBA. Array
//! metadata and key/value pairs travel in tEXt chunks. Compiled in with
//! the `png_format` feature.

use super::field::{self, Field};
use super::Format;
use crate::error::{NrrdError, Result};
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use byteordered::Endianness;
use std::io::Write;

/// The PNG container format.
#[derive(Debug)]
pub struct Png;

const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// tEXt keyword holding plain comments.
const COMMENT_KEY: &str = "comment";

fn channels(nrrd: &Nrrd) -> Option<u32> {
    match nrrd.dim() {
        2 => Some(1),
        3 => {
            let c = nrrd.sizes()[0];
            if (1..=4).contains(&c) {
                Some(c as u32)
            } else {
                None
            }
        }
        _ => None,
    }
}

impl Format for Png {
    fn name(&self) -> &'static str {
        "png"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["png"]
    }

    fn available(&self) -> bool {
        true
    }

    fn fits(&self, nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        matches!(nrrd.ty, NrrdType::Uint8 | NrrdType::Uint16) && channels(nrrd).is_some()
    }

    fn sniff(&self, start: &[u8]) -> bool {
        start.starts_with(&SIGNATURE)
    }

    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "png read";
        *nrrd = Nrrd::new();

        let mut decoder = png::Decoder::new(&mut *src);
        decoder.set_transformations(png::Transformations::EXPAND);
        let mut reader = decoder
            .read_info()
            .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let frame = reader
            .next_frame(&mut buf)
            .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        buf.truncate(frame.buffer_size());

        let ty = match frame.bit_depth {
            png::BitDepth::Eight => NrrdType::Uint8,
            png::BitDepth::Sixteen => NrrdType::Uint16,
            other => {
                return Err(NrrdError::unsupported(format!(
                    "{}: bit depth {:?} after expansion",
                    me, other
                )));
            }
        };
        let nchan: usize = match frame.color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::Rgb => 3,
            png::ColorType::Rgba => 4,
            png::ColorType::Indexed => {
                return Err(NrrdError::parse(format!(
                    "{}: palette image survived expansion",
                    me
                )));
            }
        };
        // PNG 16-bit samples are big-endian on the wire
        if ty == NrrdType::Uint16 && Endianness::native() == Endianness::Little {
            util::swap_endian(&mut buf, 2);
        }

        nrrd.ty = ty;
        let sizes: Vec<usize> = if nchan == 1 {
            vec![frame.width as usize, frame.height as usize]
        } else {
            vec![nchan, frame.width as usize, frame.height as usize]
        };
        nrrd.axes = sizes.iter().map(|&s| crate::axis::Axis::sized(s)).collect();
        nrrd.data = buf;

        let mut chunks: Vec<(String, String)> = Vec::new();
        for t in &reader.info().uncompressed_latin1_text {
            chunks.push((t.keyword.clone(), t.text.clone()));
        }
        for t in &reader.info().utf8_text {
            if let Ok(text) = t.get_text() {
                chunks.push((t.keyword.clone(), text));
            }
        }
        for (key, text) in chunks {
            if key == COMMENT_KEY {
                nrrd.comment_add(&text);
            } else if let Some(f) = Field::from_name(&key) {
                if field::FOREIGN_FIELDS.contains(&f) {
                    field::parse_field(nrrd, io, f, &text)?;
                } else {
                    io.warn(format!(
                        "{}: ignoring text chunk with field keyword \"{}\"",
                        me, key
                    ));
                }
            } else {
                nrrd.kvp_add(&key, &text)?;
            }
        }
        nrrd.check()
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "png write";
        let nchan = channels(nrrd).filter(|_| self.fits(nrrd, io)).ok_or_else(|| {
            NrrdError::unsupported(format!(
                "{}: only 8/16-bit gray(+alpha), RGB or RGBA arrays fit in PNG",
                me
            ))
        })?;
        let sizes = nrrd.sizes();
        let (width, height) = if nrrd.dim() == 2 {
            (sizes[0], sizes[1])
        } else {
            (sizes[1], sizes[2])
        };

        let mut encoder = png::Encoder::new(&mut *dst, width as u32, height as u32);
        encoder.set_color(match nchan {
            1 => png::ColorType::Grayscale,
            2 => png::ColorType::GrayscaleAlpha,
            3 => png::ColorType::Rgb,
            _ => png::ColorType::Rgba,
        });
        encoder.set_depth(if nrrd.ty == NrrdType::Uint8 {
            png::BitDepth::Eight
        } else {
            png::BitDepth::Sixteen
        });
        for line in field::foreign_field_lines(nrrd, io) {
            let at = line.find(": ").unwrap_or(0);
            encoder
                .add_text_chunk(line[..at].to_string(), line[at + 2..].to_string())
                .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        }
        for c in &nrrd.comments {
            encoder
                .add_text_chunk(COMMENT_KEY.to_string(), c.clone())
                .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        }
        for (k, v) in nrrd.kvps() {
            encoder
                .add_text_chunk(k.to_string(), v.to_string())
                .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        if nrrd.ty == NrrdType::Uint16 && Endianness::native() == Endianness::Little {
            let mut swapped = nrrd.data.clone();
            util::swap_endian(&mut swapped, 2);
            writer
                .write_image_data(&swapped)
                .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        } else {
            writer
                .write_image_data(&nrrd.data)
                .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        }
        writer
            .finish()
            .map_err(|e| NrrdError::parse(format!("{}: {}", me, e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Unseekable;
    use std::io::Cursor;

    fn round_trip(nrrd: &Nrrd) -> (Nrrd, NrrdIoState) {
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Png.write(&mut bytes, nrrd, &mut io).unwrap();
        assert!(Png.sniff(&bytes));

        let mut io2 = NrrdIoState::new();
        let mut back = Nrrd::new();
        let mut src = Unseekable(Cursor::new(bytes));
        Png.read(&mut src, &mut back, &mut io2).unwrap();
        (back, io2)
    }

    #[test]
    fn gray8() {
        let nrrd = Nrrd::from_vec(vec![0u8, 50, 100, 150, 200, 250], &[3, 2]).unwrap();
        let (back, _) = round_trip(&nrrd);
        assert_eq!(back.ty, NrrdType::Uint8);
        assert_eq!(back.sizes(), vec![3, 2]);
        assert_eq!(back.values::<u8>().unwrap(), nrrd.values::<u8>().unwrap());
    }

    #[test]
    fn rgb16_with_metadata() {
        let mut nrrd =
            Nrrd::from_vec((0..12u16).map(|v| v * 1000).collect(), &[3, 2, 2]).unwrap();
        nrrd.axes[1].spacing = 0.25;
        nrrd.kvp_add("patient", "phantom").unwrap();
        nrrd.comment_add("synthetic");
        let (back, _) = round_trip(&nrrd);
        assert_eq!(back.ty, NrrdType::Uint16);
        assert_eq!(back.sizes(), vec![3, 2, 2]);
        assert_eq!(back.values::<u16>().unwrap(), nrrd.values::<u16>().unwrap());
        assert_eq!(back.axes[1].spacing, 0.25);
        assert_eq!(back.kvp_get("patient"), Some("phantom"));
        assert_eq!(back.comments, vec!["synthetic".to_string()]);
    }

    #[test]
    fn wrong_type_rejected() {
        let nrrd = Nrrd::from_vec(vec![1.0f32; 4], &[2, 2]).unwrap();
        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        assert!(Png.write(&mut bytes, &nrrd, &mut io).is_err());
    }
}
