//! Legacy VTK structured points: exactly 3-D scalar arrays. Binary
//! payloads are big-endian by VTK decree, whatever the host order.

use super::Format;
use crate::encoding::{self, NrrdEncoding};
use crate::error::{NrrdError, Result};
use crate::fp;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput};
use byteordered::Endianness;
use std::io::Write;

/// The legacy VTK container format.
#[derive(Debug)]
pub struct Vtk;

const MAGIC: &str = "# vtk DataFile Version";

fn vtk_type_name(ty: NrrdType) -> Option<&'static str> {
    use NrrdType::*;
    Some(match ty {
        Int8 => "char",
        Uint8 => "unsigned_char",
        Int16 => "short",
        Uint16 => "unsigned_short",
        Int32 => "int",
        Uint32 => "unsigned_int",
        Int64 => "long",
        Uint64 => "unsigned_long",
        Float => "float",
        Double => "double",
        Block | Unknown => return None,
    })
}

fn vtk_type_from_name(name: &str) -> Option<NrrdType> {
    use NrrdType::*;
    Some(match name {
        "char" => Int8,
        "unsigned_char" => Uint8,
        "short" => Int16,
        "unsigned_short" => Uint16,
        "int" => Int32,
        "unsigned_int" => Uint32,
        "long" => Int64,
        "unsigned_long" => Uint64,
        "float" => Float,
        "double" => Double,
        _ => return None,
    })
}

fn need_line(src: &mut dyn DataInput, what: &str) -> Result<String> {
    util::read_line(src)?.ok_or_else(|| {
        NrrdError::parse(format!("vtk read: hit end of input wanting {}", what))
    })
}

impl Format for Vtk {
    fn name(&self) -> &'static str {
        "vtk"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["vtk"]
    }

    fn fits(&self, nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        nrrd.dim() == 3 && vtk_type_name(nrrd.ty).is_some()
    }

    fn sniff(&self, start: &[u8]) -> bool {
        start.starts_with(MAGIC.as_bytes())
    }

    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "vtk read";
        *nrrd = Nrrd::new();

        let magic = need_line(src, "the magic")?;
        if !magic.starts_with(MAGIC) {
            return Err(NrrdError::parse(format!(
                "{}: bad magic \"{}\"",
                me, magic
            )));
        }
        let content = need_line(src, "the title line")?;
        let data_kind = need_line(src, "ASCII or BINARY")?;
        let binary = match data_kind.trim() {
            "BINARY" => true,
            "ASCII" => false,
            other => {
                return Err(NrrdError::parse(format!(
                    "{}: expected ASCII or BINARY, got \"{}\"",
                    me, other
                )));
            }
        };
        let dataset = need_line(src, "the DATASET line")?;
        if dataset.trim() != "DATASET STRUCTURED_POINTS" {
            return Err(NrrdError::unsupported(format!(
                "{}: only STRUCTURED_POINTS datasets are readable, got \"{}\"",
                me,
                dataset.trim()
            )));
        }

        let mut dims: Option<Vec<usize>> = None;
        let mut spacing = [1.0f64; 3];
        let mut origin = [0.0f64; 3];
        let npoints: usize;
        loop {
            let line = need_line(src, "POINT_DATA")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let (key, rest) = line.split_at(line.find(' ').unwrap_or(line.len()));
            match key {
                "DIMENSIONS" => {
                    dims = Some(util::parse_sizes(rest, 3, "DIMENSIONS")?);
                }
                "SPACING" | "ASPECT_RATIO" => {
                    spacing.copy_from_slice(&util::parse_doubles(rest, 3, key)?);
                }
                "ORIGIN" => {
                    origin.copy_from_slice(&util::parse_doubles(rest, 3, key)?);
                }
                "POINT_DATA" => {
                    npoints = rest.trim().parse().map_err(|_| {
                        NrrdError::parse(format!("{}: bad POINT_DATA \"{}\"", me, rest))
                    })?;
                    break;
                }
                other => {
                    return Err(NrrdError::parse(format!(
                        "{}: unexpected \"{}\" line",
                        me, other
                    )));
                }
            }
        }
        let dims = dims.ok_or_else(|| {
            NrrdError::parse(format!("{}: never saw a DIMENSIONS line", me))
        })?;
        let expect = dims.iter().try_fold(1usize, |n, &s| n.checked_mul(s));
        if Some(npoints) != expect {
            return Err(NrrdError::parse(format!(
                "{}: POINT_DATA {} doesn't match DIMENSIONS {:?}",
                me, npoints, dims
            )));
        }

        let attr = need_line(src, "the SCALARS line")?;
        let toks: Vec<&str> = attr.split_whitespace().collect();
        if toks.first() != Some(&"SCALARS") {
            return Err(NrrdError::unsupported(format!(
                "{}: only SCALARS attributes are readable, got \"{}\"",
                me,
                attr.trim()
            )));
        }
        if toks.len() < 3 || (toks.len() == 4 && toks[3] != "1") || toks.len() > 4 {
            return Err(NrrdError::unsupported(format!(
                "{}: only single-component SCALARS are readable",
                me
            )));
        }
        let ty = vtk_type_from_name(toks[2]).ok_or_else(|| {
            NrrdError::parse(format!("{}: unknown VTK type \"{}\"", me, toks[2]))
        })?;
        let lut = need_line(src, "the LOOKUP_TABLE line")?;
        if !lut.trim_start().starts_with("LOOKUP_TABLE") {
            return Err(NrrdError::parse(format!(
                "{}: expected LOOKUP_TABLE, got \"{}\"",
                me,
                lut.trim()
            )));
        }

        nrrd.ty = ty;
        nrrd.axes = dims.iter().map(|&s| crate::axis::Axis::sized(s)).collect();
        for (i, ax) in nrrd.axes.iter_mut().enumerate() {
            ax.spacing = spacing[i];
            ax.min = origin[i];
        }
        if !content.trim().is_empty() {
            nrrd.content = Some(content.trim().to_string());
        }

        let mut data = vec![0u8; npoints * ty.size_of()];
        if binary {
            io.encoding = &encoding::Raw;
            io.encoding.read(src, &mut data, nrrd, io)?;
            if Endianness::native() == Endianness::Little {
                util::swap_endian(&mut data, ty.size_of());
            }
        } else {
            io.encoding = &encoding::Ascii;
            io.encoding.read(src, &mut data, nrrd, io)?;
        }
        nrrd.data = data;
        nrrd.check()
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "vtk write";
        let ty_name = vtk_type_name(nrrd.ty).filter(|_| nrrd.dim() == 3).ok_or_else(|| {
            NrrdError::unsupported(format!(
                "{}: only 3-D scalar arrays fit in VTK",
                me
            ))
        })?;
        let ascii = io.encoding.is_text();
        let sizes = nrrd.sizes();
        let spacing: Vec<f64> = nrrd
            .axes
            .iter()
            .map(|ax| if fp::exists(ax.spacing) { ax.spacing } else { 1.0 })
            .collect();
        let origin: Vec<f64> = nrrd
            .axes
            .iter()
            .map(|ax| if fp::exists(ax.min) { ax.min } else { 0.0 })
            .collect();

        let header = format!(
            "{} 3.0\n{}\n{}\nDATASET STRUCTURED_POINTS\n\
             DIMENSIONS {} {} {}\nSPACING {} {} {}\nORIGIN {} {} {}\n\
             POINT_DATA {}\nSCALARS scalars {}\nLOOKUP_TABLE default\n",
            MAGIC,
            nrrd.content.as_deref().unwrap_or("volume"),
            if ascii { "ASCII" } else { "BINARY" },
            sizes[0],
            sizes[1],
            sizes[2],
            util::fmt_double(spacing[0]),
            util::fmt_double(spacing[1]),
            util::fmt_double(spacing[2]),
            util::fmt_double(origin[0]),
            util::fmt_double(origin[1]),
            util::fmt_double(origin[2]),
            nrrd.element_count(),
            ty_name,
        );
        util::write_all_chunked(dst, header.as_bytes(), me)?;

        if ascii {
            encoding::Ascii.write(dst, &nrrd.data, nrrd, io)
        } else if Endianness::native() == Endianness::Little && nrrd.element_size() > 1 {
            let mut swapped = nrrd.data.clone();
            util::swap_endian(&mut swapped, nrrd.element_size());
            encoding::Raw.write(dst, &swapped, nrrd, io)
        } else {
            encoding::Raw.write(dst, &nrrd.data, nrrd, io)
        }
    }
}
