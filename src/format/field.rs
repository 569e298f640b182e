//! Header fields: the `name: value` lines shared by the native format
//! and the comment-embedded metadata of the foreign formats. [`Field`]
//! enumerates them; [`parse_field`] applies one to an array under
//! construction, [`field_line`] prints one back out.

use crate::axis::DIM_MAX;
use crate::encoding;
use crate::error::{NrrdError, Result};
use crate::fp;
use crate::io::{DataFileSpec, NrrdIoState};
use crate::object::Nrrd;
use crate::typedef::{AxisKind, Centering, NrrdType, Space};
use crate::util;
use byteordered::Endianness;

/// Every field a header line can carry. Discriminants index the
/// seen-fields bitmask kept during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Field {
    Comment = 0,
    Content = 1,
    Number = 2,
    Type = 3,
    BlockSize = 4,
    Dimension = 5,
    Space = 6,
    Sizes = 7,
    Spacings = 8,
    Thicknesses = 9,
    AxisMins = 10,
    AxisMaxs = 11,
    SpaceDirections = 12,
    Centers = 13,
    Kinds = 14,
    Labels = 15,
    Units = 16,
    Min = 17,
    Max = 18,
    OldMin = 19,
    OldMax = 20,
    Endian = 21,
    Encoding = 22,
    LineSkip = 23,
    ByteSkip = 24,
    KeyValue = 25,
    SampleUnits = 26,
    SpaceUnits = 27,
    SpaceOrigin = 28,
    MeasurementFrame = 29,
    SpaceDimension = 30,
    DataFile = 31,
}

impl Field {
    /// Bit of this field in the seen-fields mask.
    pub(crate) fn bit(self) -> u64 {
        1u64 << (self as u8)
    }

    /// Canonical spelling, as written in headers.
    pub(crate) fn name(self) -> &'static str {
        use Field::*;
        match self {
            Comment => "comment",
            Content => "content",
            Number => "number",
            Type => "type",
            BlockSize => "block size",
            Dimension => "dimension",
            Space => "space",
            Sizes => "sizes",
            Spacings => "spacings",
            Thicknesses => "thicknesses",
            AxisMins => "axis mins",
            AxisMaxs => "axis maxs",
            SpaceDirections => "space directions",
            Centers => "centers",
            Kinds => "kinds",
            Labels => "labels",
            Units => "units",
            Min => "min",
            Max => "max",
            OldMin => "old min",
            OldMax => "old max",
            Endian => "endian",
            Encoding => "encoding",
            LineSkip => "line skip",
            ByteSkip => "byte skip",
            KeyValue => "keyvalue",
            SampleUnits => "sample units",
            SpaceUnits => "space units",
            SpaceOrigin => "space origin",
            MeasurementFrame => "measurement frame",
            SpaceDimension => "space dimension",
            DataFile => "data file",
        }
    }

    /// Identify a field, accepting the spellings with and without
    /// internal spaces, case-insensitively.
    pub(crate) fn from_name(name: &str) -> Option<Field> {
        use Field::*;
        let mut flat = name.trim().to_ascii_lowercase();
        flat.retain(|c| c != ' ');
        Some(match flat.as_str() {
            "comment" => Comment,
            "content" => Content,
            "number" => Number,
            "type" => Type,
            "blocksize" => BlockSize,
            "dimension" => Dimension,
            "space" => Space,
            "sizes" => Sizes,
            "spacings" => Spacings,
            "thicknesses" => Thicknesses,
            "axismins" => AxisMins,
            "axismaxs" => AxisMaxs,
            "spacedirections" => SpaceDirections,
            "centers" | "centerings" => Centers,
            "kinds" => Kinds,
            "labels" => Labels,
            "units" => Units,
            "min" => Min,
            "max" => Max,
            "oldmin" => OldMin,
            "oldmax" => OldMax,
            "endian" => Endian,
            "encoding" => Encoding,
            "lineskip" => LineSkip,
            "byteskip" => ByteSkip,
            "keyvalue" => KeyValue,
            "sampleunits" => SampleUnits,
            "spaceunits" => SpaceUnits,
            "spaceorigin" => SpaceOrigin,
            "measurementframe" => MeasurementFrame,
            "spacedimension" => SpaceDimension,
            "datafile" => DataFile,
            _ => return None,
        })
    }
}

/// Whether `key` collides with a header field name; such strings cannot
/// be keys of key/value pairs.
pub(crate) fn is_reserved_key(key: &str) -> bool {
    Field::from_name(key).is_some()
}

/// Fields the foreign formats may smuggle inside their comment syntax.
/// Shape, type and encoding are excluded: those are the native business
/// of the enclosing format.
pub(crate) const FOREIGN_FIELDS: &[Field] = &[
    Field::Content,
    Field::Space,
    Field::SpaceDimension,
    Field::Spacings,
    Field::Thicknesses,
    Field::AxisMins,
    Field::AxisMaxs,
    Field::SpaceDirections,
    Field::Centers,
    Field::Kinds,
    Field::Labels,
    Field::Units,
    Field::OldMin,
    Field::OldMax,
    Field::SampleUnits,
    Field::SpaceUnits,
    Field::SpaceOrigin,
    Field::MeasurementFrame,
];

/// Try to interpret a foreign format's comment line as a smuggled header
/// field; `Ok(false)` means the line is an ordinary comment. Call only
/// once the array shape is known.
pub(crate) fn parse_comment_metadata(
    nrrd: &mut Nrrd,
    io: &mut NrrdIoState,
    line: &str,
) -> Result<bool> {
    let at = match line.find(": ") {
        Some(at) => at,
        None => return Ok(false),
    };
    let f = match Field::from_name(&line[..at]) {
        Some(f) if FOREIGN_FIELDS.contains(&f) => f,
        _ => return Ok(false),
    };
    parse_field(nrrd, io, f, &line[at + 2..])?;
    Ok(true)
}

/// Render the smuggled-field comment lines a foreign format writes, one
/// `name: value` string per applicable field (no comment marker).
pub(crate) fn foreign_field_lines(nrrd: &Nrrd, io: &NrrdIoState) -> Vec<String> {
    FOREIGN_FIELDS
        .iter()
        .filter_map(|&f| field_line(f, nrrd, io))
        .collect()
}

fn need_dimension(nrrd: &Nrrd, field: Field) -> Result<usize> {
    let dim = nrrd.dim();
    if dim == 0 {
        return Err(NrrdError::parse(format!(
            "parse_field: \"{}\" given before \"dimension\"",
            field.name()
        )));
    }
    Ok(dim)
}

fn need_space_dimension(nrrd: &Nrrd, field: Field) -> Result<usize> {
    if nrrd.space_dim == 0 {
        return Err(NrrdError::parse(format!(
            "parse_field: \"{}\" given before \"space\" or \"space dimension\"",
            field.name()
        )));
    }
    Ok(nrrd.space_dim)
}

/// Apply one parsed header field to `nrrd`/`io`. The caller has already
/// split the line into field name and value and resolved the name with
/// [`Field::from_name`].
pub(crate) fn parse_field(
    nrrd: &mut Nrrd,
    io: &mut NrrdIoState,
    field: Field,
    value: &str,
) -> Result<()> {
    let me = "parse_field";
    let value = value.trim();
    match field {
        Field::Comment | Field::KeyValue => {
            // handled by the header line scanner, never dispatched here
        }
        Field::Content => {
            nrrd.content = Some(value.to_string());
        }
        Field::Number => {
            // informational; the element count is derived from sizes
        }
        Field::Type => {
            nrrd.ty = NrrdType::from_name(value).ok_or_else(|| {
                NrrdError::parse(format!("{}: unknown type \"{}\"", me, value))
            })?;
            if nrrd.ty == NrrdType::Unknown {
                return Err(NrrdError::parse(format!(
                    "{}: type \"{}\" is not a data type",
                    me, value
                )));
            }
        }
        Field::BlockSize => {
            nrrd.block_size = value.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad block size \"{}\"", me, value))
            })?;
        }
        Field::Dimension => {
            let dim: usize = value.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad dimension \"{}\"", me, value))
            })?;
            if dim == 0 || dim > DIM_MAX {
                return Err(NrrdError::parse(format!(
                    "{}: dimension {} outside [1,{}]",
                    me, dim, DIM_MAX
                )));
            }
            nrrd.axes = vec![Default::default(); dim];
        }
        Field::Space => {
            let space = Space::from_name(value).ok_or_else(|| {
                NrrdError::parse(format!("{}: unknown space \"{}\"", me, value))
            })?;
            nrrd.space = Some(space);
            nrrd.space_dim = space.dimension();
        }
        Field::SpaceDimension => {
            let sd: usize = value.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad space dimension \"{}\"", me, value))
            })?;
            if sd == 0 || sd > crate::axis::SPACE_DIM_MAX {
                return Err(NrrdError::parse(format!(
                    "{}: space dimension {} outside [1,{}]",
                    me,
                    sd,
                    crate::axis::SPACE_DIM_MAX
                )));
            }
            nrrd.space_dim = sd;
        }
        Field::Sizes => {
            let dim = need_dimension(nrrd, field)?;
            let sizes = util::parse_sizes(value, dim, field.name())?;
            for (ax, &s) in nrrd.axes.iter_mut().zip(&sizes) {
                ax.size = s;
            }
        }
        Field::Spacings => {
            let dim = need_dimension(nrrd, field)?;
            let v = util::parse_doubles(value, dim, field.name())?;
            for (ax, &x) in nrrd.axes.iter_mut().zip(&v) {
                ax.spacing = x;
            }
        }
        Field::Thicknesses => {
            let dim = need_dimension(nrrd, field)?;
            let v = util::parse_doubles(value, dim, field.name())?;
            for (ax, &x) in nrrd.axes.iter_mut().zip(&v) {
                ax.thickness = x;
            }
        }
        Field::AxisMins => {
            let dim = need_dimension(nrrd, field)?;
            let v = util::parse_doubles(value, dim, field.name())?;
            for (ax, &x) in nrrd.axes.iter_mut().zip(&v) {
                ax.min = x;
            }
        }
        Field::AxisMaxs => {
            let dim = need_dimension(nrrd, field)?;
            let v = util::parse_doubles(value, dim, field.name())?;
            for (ax, &x) in nrrd.axes.iter_mut().zip(&v) {
                ax.max = x;
            }
        }
        Field::SpaceDirections => {
            let dim = need_dimension(nrrd, field)?;
            let sd = need_space_dimension(nrrd, field)?;
            let toks: Vec<&str> = value.split_whitespace().collect();
            if toks.len() != dim {
                return Err(NrrdError::parse(format!(
                    "{}: got {} space directions, needed {}",
                    me,
                    toks.len(),
                    dim
                )));
            }
            for (ax, tok) in nrrd.axes.iter_mut().zip(&toks) {
                if tok.eq_ignore_ascii_case("none") {
                    ax.space_direction = [fp::nan(); crate::axis::SPACE_DIM_MAX];
                } else {
                    let v = util::parse_vector(tok, field.name())?;
                    if v.len() != sd {
                        return Err(NrrdError::parse(format!(
                            "{}: direction {} has {} components, space dimension is {}",
                            me,
                            tok,
                            v.len(),
                            sd
                        )));
                    }
                    ax.space_direction = [fp::nan(); crate::axis::SPACE_DIM_MAX];
                    ax.space_direction[..sd].copy_from_slice(&v);
                }
            }
        }
        Field::Centers => {
            let dim = need_dimension(nrrd, field)?;
            let toks: Vec<&str> = value.split_whitespace().collect();
            if toks.len() != dim {
                return Err(NrrdError::parse(format!(
                    "{}: got {} centerings, needed {}",
                    me,
                    toks.len(),
                    dim
                )));
            }
            for (ax, tok) in nrrd.axes.iter_mut().zip(&toks) {
                ax.center = Centering::from_name(tok).ok_or_else(|| {
                    NrrdError::parse(format!("{}: unknown centering \"{}\"", me, tok))
                })?;
            }
        }
        Field::Kinds => {
            let dim = need_dimension(nrrd, field)?;
            let toks: Vec<&str> = value.split_whitespace().collect();
            if toks.len() != dim {
                return Err(NrrdError::parse(format!(
                    "{}: got {} kinds, needed {}",
                    me,
                    toks.len(),
                    dim
                )));
            }
            for (ax, tok) in nrrd.axes.iter_mut().zip(&toks) {
                ax.kind = AxisKind::from_name(tok).ok_or_else(|| {
                    NrrdError::parse(format!("{}: unknown kind \"{}\"", me, tok))
                })?;
            }
        }
        Field::Labels => {
            let dim = need_dimension(nrrd, field)?;
            let labels = util::parse_quoted_strings(value, dim, field.name())?;
            for (ax, l) in nrrd.axes.iter_mut().zip(labels) {
                ax.label = if l.is_empty() { None } else { Some(l) };
            }
        }
        Field::Units => {
            let dim = need_dimension(nrrd, field)?;
            let units = util::parse_quoted_strings(value, dim, field.name())?;
            for (ax, u) in nrrd.axes.iter_mut().zip(units) {
                ax.units = if u.is_empty() { None } else { Some(u) };
            }
        }
        Field::Min | Field::Max => {
            // accepted for compatibility with old headers; the actual
            // range of the values is recomputed on demand, never trusted
            // from the file
            let _ = util::parse_double(value)?;
        }
        Field::OldMin => {
            nrrd.old_min = util::parse_double(value)?;
        }
        Field::OldMax => {
            nrrd.old_max = util::parse_double(value)?;
        }
        Field::Endian => {
            io.endian = Some(match value.to_ascii_lowercase().as_str() {
                "little" => Endianness::Little,
                "big" => Endianness::Big,
                _ => {
                    return Err(NrrdError::parse(format!(
                        "{}: unknown endianness \"{}\"",
                        me, value
                    )));
                }
            });
        }
        Field::Encoding => {
            let enc = encoding::from_name(value).ok_or_else(|| {
                NrrdError::parse(format!("{}: unknown encoding \"{}\"", me, value))
            })?;
            if !enc.available() {
                return Err(NrrdError::unavailable(me, enc.name()));
            }
            io.encoding = enc;
        }
        Field::LineSkip => {
            io.line_skip = value.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad line skip \"{}\"", me, value))
            })?;
        }
        Field::ByteSkip => {
            let skip: i64 = value.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad byte skip \"{}\"", me, value))
            })?;
            if skip < -1 {
                return Err(NrrdError::parse(format!(
                    "{}: byte skip {} invalid (only >= -1 makes sense)",
                    me, skip
                )));
            }
            io.byte_skip = skip;
        }
        Field::SampleUnits => {
            nrrd.sample_units = Some(value.to_string());
        }
        Field::SpaceUnits => {
            let sd = need_space_dimension(nrrd, field)?;
            let units = util::parse_quoted_strings(value, sd, field.name())?;
            nrrd.space_units = units
                .into_iter()
                .map(|u| if u.is_empty() { None } else { Some(u) })
                .collect();
        }
        Field::SpaceOrigin => {
            let sd = need_space_dimension(nrrd, field)?;
            let v = util::parse_vector(value, field.name())?;
            if v.len() != sd {
                return Err(NrrdError::parse(format!(
                    "{}: origin has {} components, space dimension is {}",
                    me,
                    v.len(),
                    sd
                )));
            }
            nrrd.space_origin = [fp::nan(); crate::axis::SPACE_DIM_MAX];
            nrrd.space_origin[..sd].copy_from_slice(&v);
        }
        Field::MeasurementFrame => {
            let sd = need_space_dimension(nrrd, field)?;
            let toks: Vec<&str> = value.split_whitespace().collect();
            if toks.len() != sd {
                return Err(NrrdError::parse(format!(
                    "{}: got {} measurement frame vectors, needed {}",
                    me,
                    toks.len(),
                    sd
                )));
            }
            for (i, tok) in toks.iter().enumerate() {
                let v = util::parse_vector(tok, field.name())?;
                if v.len() != sd {
                    return Err(NrrdError::parse(format!(
                        "{}: frame vector {} has {} components, space dimension is {}",
                        me,
                        tok,
                        v.len(),
                        sd
                    )));
                }
                nrrd.measurement_frame[i] = [fp::nan(); crate::axis::SPACE_DIM_MAX];
                nrrd.measurement_frame[i][..sd].copy_from_slice(&v);
            }
        }
        Field::DataFile => {
            io.data_file = Some(parse_data_file(nrrd, value)?);
        }
    }
    io.seen |= field.bit();
    Ok(())
}

/// Parse a `data file:` value: `LIST [subdim]`, a printf-style pattern
/// `<format> <min> <max> <step> [subdim]`, or a single filename.
fn parse_data_file(nrrd: &Nrrd, value: &str) -> Result<DataFileSpec> {
    let me = "parse_data_file";
    let toks: Vec<&str> = value.split_whitespace().collect();
    if toks.is_empty() {
        return Err(NrrdError::parse(format!("{}: empty value", me)));
    }
    if toks[0] == "LIST" {
        let subdim = match toks.len() {
            1 => None,
            2 => Some(parse_subdim(nrrd, toks[1])?),
            n => {
                return Err(NrrdError::parse(format!(
                    "{}: LIST takes at most one argument, got {}",
                    me,
                    n - 1
                )));
            }
        };
        return Ok(DataFileSpec::List { subdim });
    }
    if toks.len() >= 4 && toks[0].contains('%') {
        if toks.len() > 5 {
            return Err(NrrdError::parse(format!(
                "{}: pattern form takes 4 or 5 tokens, got {}",
                me,
                toks.len()
            )));
        }
        let int = |t: &str, what: &str| -> Result<i64> {
            t.parse().map_err(|_| {
                NrrdError::parse(format!("{}: bad {} \"{}\"", me, what, t))
            })
        };
        let min = int(toks[1], "min")?;
        let max = int(toks[2], "max")?;
        let step = int(toks[3], "step")?;
        if step == 0 {
            return Err(NrrdError::parse(format!("{}: step can't be 0", me)));
        }
        if (step > 0 && min > max) || (step < 0 && min < max) {
            return Err(NrrdError::parse(format!(
                "{}: range {}..{} can't be covered with step {}",
                me, min, max, step
            )));
        }
        let subdim = if toks.len() == 5 {
            Some(parse_subdim(nrrd, toks[4])?)
        } else {
            None
        };
        return Ok(DataFileSpec::Pattern {
            pattern: toks[0].to_string(),
            min,
            max,
            step,
            subdim,
        });
    }
    // a single filename, possibly with spaces
    Ok(DataFileSpec::Single(value.to_string()))
}

fn parse_subdim(nrrd: &Nrrd, tok: &str) -> Result<usize> {
    let me = "parse_data_file";
    let subdim: usize = tok.parse().map_err(|_| {
        NrrdError::parse(format!("{}: bad subdim \"{}\"", me, tok))
    })?;
    let dim = nrrd.dim();
    if dim == 0 {
        return Err(NrrdError::parse(format!(
            "{}: subdim given before \"dimension\"",
            me
        )));
    }
    if subdim == 0 || subdim > dim {
        return Err(NrrdError::parse(format!(
            "{}: subdim {} outside [1,{}]",
            me, subdim, dim
        )));
    }
    Ok(subdim)
}

/// Print one field as a full `name: value` header line, or `None` when
/// the array has nothing to say for it.
pub(crate) fn field_line(field: Field, nrrd: &Nrrd, io: &NrrdIoState) -> Option<String> {
    let value = field_value(field, nrrd, io)?;
    Some(format!("{}: {}", field.name(), value))
}

fn any_axis(nrrd: &Nrrd, f: impl Fn(&crate::axis::Axis) -> bool) -> bool {
    nrrd.axes.iter().any(f)
}

fn per_axis_doubles(nrrd: &Nrrd, get: impl Fn(&crate::axis::Axis) -> f64) -> String {
    nrrd.axes
        .iter()
        .map(|ax| util::fmt_double(get(ax)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn field_value(field: Field, nrrd: &Nrrd, io: &NrrdIoState) -> Option<String> {
    match field {
        Field::Comment | Field::KeyValue | Field::Number | Field::Min | Field::Max => None,
        Field::Content => nrrd.content.clone(),
        Field::Type => Some(nrrd.ty.name().to_string()),
        Field::BlockSize => {
            if nrrd.ty == NrrdType::Block {
                Some(nrrd.block_size.to_string())
            } else {
                None
            }
        }
        Field::Dimension => Some(nrrd.dim().to_string()),
        Field::Space => nrrd.space.map(|s| s.name().to_string()),
        Field::SpaceDimension => {
            // only when there is no space tag implying it
            if nrrd.space.is_none() && nrrd.space_dim > 0 {
                Some(nrrd.space_dim.to_string())
            } else {
                None
            }
        }
        Field::Sizes => Some(
            nrrd.axes
                .iter()
                .map(|ax| ax.size.to_string())
                .collect::<Vec<_>>()
                .join(" "),
        ),
        Field::Spacings => {
            if any_axis(nrrd, |ax| fp::exists(ax.spacing)) {
                Some(per_axis_doubles(nrrd, |ax| ax.spacing))
            } else {
                None
            }
        }
        Field::Thicknesses => {
            if any_axis(nrrd, |ax| fp::exists(ax.thickness)) {
                Some(per_axis_doubles(nrrd, |ax| ax.thickness))
            } else {
                None
            }
        }
        Field::AxisMins => {
            if any_axis(nrrd, |ax| fp::exists(ax.min)) {
                Some(per_axis_doubles(nrrd, |ax| ax.min))
            } else {
                None
            }
        }
        Field::AxisMaxs => {
            if any_axis(nrrd, |ax| fp::exists(ax.max)) {
                Some(per_axis_doubles(nrrd, |ax| ax.max))
            } else {
                None
            }
        }
        Field::SpaceDirections => {
            let sd = nrrd.space_dim;
            if sd == 0 {
                return None;
            }
            Some(
                nrrd.axes
                    .iter()
                    .map(|ax| {
                        if ax.has_space_direction(sd) {
                            util::format_vector(&ax.space_direction[..sd])
                        } else {
                            "none".to_string()
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
        Field::Centers => {
            if any_axis(nrrd, |ax| ax.center != Centering::Unknown) {
                Some(
                    nrrd.axes
                        .iter()
                        .map(|ax| ax.center.name())
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            } else {
                None
            }
        }
        Field::Kinds => {
            if any_axis(nrrd, |ax| ax.kind != AxisKind::Unknown) {
                Some(
                    nrrd.axes
                        .iter()
                        .map(|ax| ax.kind.name())
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            } else {
                None
            }
        }
        Field::Labels => {
            if any_axis(nrrd, |ax| ax.label.is_some()) {
                Some(
                    nrrd.axes
                        .iter()
                        .map(|ax| util::format_quoted(ax.label.as_deref().unwrap_or("")))
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            } else {
                None
            }
        }
        Field::Units => {
            if any_axis(nrrd, |ax| ax.units.is_some()) {
                Some(
                    nrrd.axes
                        .iter()
                        .map(|ax| util::format_quoted(ax.units.as_deref().unwrap_or("")))
                        .collect::<Vec<_>>()
                        .join(" "),
                )
            } else {
                None
            }
        }
        Field::OldMin => {
            if fp::exists(nrrd.old_min) {
                Some(util::fmt_double(nrrd.old_min))
            } else {
                None
            }
        }
        Field::OldMax => {
            if fp::exists(nrrd.old_max) {
                Some(util::fmt_double(nrrd.old_max))
            } else {
                None
            }
        }
        Field::Endian => {
            // meaningless for single-byte elements and text encodings
            if io.encoding.is_text() || nrrd.element_size() == 1 || nrrd.ty == NrrdType::Block {
                return None;
            }
            Some(
                match io.endian.unwrap_or_else(Endianness::native) {
                    Endianness::Little => "little",
                    Endianness::Big => "big",
                }
                .to_string(),
            )
        }
        Field::Encoding => Some(io.encoding.name().to_string()),
        Field::LineSkip => {
            if io.line_skip > 0 {
                Some(io.line_skip.to_string())
            } else {
                None
            }
        }
        Field::ByteSkip => {
            if io.byte_skip != 0 {
                Some(io.byte_skip.to_string())
            } else {
                None
            }
        }
        Field::SampleUnits => nrrd.sample_units.clone(),
        Field::SpaceUnits => {
            if nrrd.space_dim == 0 || nrrd.space_units.iter().all(|u| u.is_none()) {
                return None;
            }
            Some(
                nrrd.space_units
                    .iter()
                    .map(|u| util::format_quoted(u.as_deref().unwrap_or("")))
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
        Field::SpaceOrigin => {
            let sd = nrrd.space_dim;
            if sd == 0 || !fp::exists(nrrd.space_origin[0]) {
                return None;
            }
            Some(util::format_vector(&nrrd.space_origin[..sd]))
        }
        Field::MeasurementFrame => {
            let sd = nrrd.space_dim;
            if sd == 0 || !fp::exists(nrrd.measurement_frame[0][0]) {
                return None;
            }
            Some(
                (0..sd)
                    .map(|i| util::format_vector(&nrrd.measurement_frame[i][..sd]))
                    .collect::<Vec<_>>()
                    .join(" "),
            )
        }
        Field::DataFile => match &io.data_file {
            Some(DataFileSpec::Single(f)) => Some(f.clone()),
            Some(DataFileSpec::Pattern {
                pattern,
                min,
                max,
                step,
                subdim,
            }) => {
                let mut s = format!("{} {} {} {}", pattern, min, max, step);
                if let Some(sd) = subdim {
                    s.push_str(&format!(" {}", sd));
                }
                Some(s)
            }
            Some(DataFileSpec::List { subdim }) => match subdim {
                Some(sd) => Some(format!("LIST {}", sd)),
                None => Some("LIST".to_string()),
            },
            None => None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_resolution() {
        assert_eq!(Field::from_name("sizes"), Some(Field::Sizes));
        assert_eq!(Field::from_name("axis mins"), Some(Field::AxisMins));
        assert_eq!(Field::from_name("axismins"), Some(Field::AxisMins));
        assert_eq!(Field::from_name("centerings"), Some(Field::Centers));
        assert_eq!(Field::from_name("Space Directions"), Some(Field::SpaceDirections));
        assert_eq!(Field::from_name("not a field"), None);
        assert!(is_reserved_key("block size"));
        assert!(!is_reserved_key("my annotation"));
    }

    #[test]
    fn sizes_need_dimension_first() {
        let mut nrrd = Nrrd::new();
        let mut io = NrrdIoState::default();
        assert!(parse_field(&mut nrrd, &mut io, Field::Sizes, "3 4").is_err());
        parse_field(&mut nrrd, &mut io, Field::Dimension, "2").unwrap();
        parse_field(&mut nrrd, &mut io, Field::Sizes, "3 4").unwrap();
        assert_eq!(nrrd.sizes(), vec![3, 4]);
    }

    #[test]
    fn space_directions() {
        let mut nrrd = Nrrd::new();
        let mut io = NrrdIoState::default();
        parse_field(&mut nrrd, &mut io, Field::Dimension, "3").unwrap();
        parse_field(&mut nrrd, &mut io, Field::Space, "left-posterior-superior").unwrap();
        assert_eq!(nrrd.space_dim, 3);
        parse_field(
            &mut nrrd,
            &mut io,
            Field::SpaceDirections,
            "none (1,0,0) (0,0,2.5)",
        )
        .unwrap();
        assert!(!nrrd.axes[0].has_space_direction(3));
        assert_eq!(nrrd.axes[1].space_direction[0], 1.0);
        assert_eq!(nrrd.axes[2].space_direction[2], 2.5);
        // wrong component count
        assert!(parse_field(
            &mut nrrd,
            &mut io,
            Field::SpaceDirections,
            "(1,0) (0,1) (0,0)"
        )
        .is_err());
    }

    #[test]
    fn data_file_forms() {
        let mut nrrd = Nrrd::new();
        let mut io = NrrdIoState::default();
        parse_field(&mut nrrd, &mut io, Field::Dimension, "3").unwrap();

        parse_field(&mut nrrd, &mut io, Field::DataFile, "slice.raw").unwrap();
        assert_eq!(
            io.data_file,
            Some(DataFileSpec::Single("slice.raw".to_string()))
        );

        parse_field(&mut nrrd, &mut io, Field::DataFile, "z%03d.raw 0 9 1 2").unwrap();
        assert_eq!(
            io.data_file,
            Some(DataFileSpec::Pattern {
                pattern: "z%03d.raw".to_string(),
                min: 0,
                max: 9,
                step: 1,
                subdim: Some(2),
            })
        );

        parse_field(&mut nrrd, &mut io, Field::DataFile, "LIST").unwrap();
        assert_eq!(io.data_file, Some(DataFileSpec::List { subdim: None }));

        assert!(parse_field(&mut nrrd, &mut io, Field::DataFile, "z%d.raw 0 9 0").is_err());
        assert!(parse_field(&mut nrrd, &mut io, Field::DataFile, "z%d.raw 9 0 1").is_err());
    }

    #[test]
    fn round_trip_lines() {
        let mut nrrd = Nrrd::from_vec(vec![0f64; 6], &[3, 2]).unwrap();
        nrrd.axes[0].spacing = 1.5;
        nrrd.axes[1].label = Some("y axis".to_string());
        let io = NrrdIoState::default();
        assert_eq!(
            field_line(Field::Spacings, &nrrd, &io).unwrap(),
            "spacings: 1.5 nan"
        );
        assert_eq!(
            field_line(Field::Labels, &nrrd, &io).unwrap(),
            "labels: \"\" \"y axis\""
        );
        assert_eq!(field_line(Field::Thicknesses, &nrrd, &io), None);
        assert_eq!(field_line(Field::Type, &nrrd, &io).unwrap(), "type: double");
    }
}
