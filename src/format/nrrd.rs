//! The native format: `NRRD000N` magic, `field: value` lines, `key:=value`
//! pairs and `#` comments, then a blank line and the payload (or, for
//! detached headers, `data file:` pointers to it).

use super::field::{self, Field};
use super::Format;
use crate::error::{NrrdError, Result};
use crate::fp;
use crate::io::{DataFileSpec, NrrdIoState};
use crate::object::Nrrd;
use crate::typedef::NrrdType;
use crate::util::{self, DataInput, Seekable};
use byteordered::Endianness;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

/// The native container format.
#[derive(Debug)]
pub struct Native;

/// Highest header version this crate reads and writes.
const VERSION_MAX: u32 = 5;

/// Comment lines added below the magic on write, and dropped on read so
/// they don't accumulate over load/save cycles.
const BOILERPLATE: [&str; 2] = [
    "Complete NRRD file format specification at:",
    "http://teem.sourceforge.net/nrrd/format.html",
];

/// Order fields appear in written headers.
const FIELD_ORDER: [Field; 24] = [
    Field::Content,
    Field::Type,
    Field::BlockSize,
    Field::Dimension,
    Field::Space,
    Field::SpaceDimension,
    Field::Sizes,
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
    Field::Endian,
    Field::Encoding,
];

fn parse_magic(line: &str) -> Option<u32> {
    if line == "NRRD00.01" {
        // pre-1.0 spelling of version 1
        return Some(1);
    }
    let digit = line.strip_prefix("NRRD000")?;
    let v: u32 = digit.parse().ok()?;
    if (1..=VERSION_MAX).contains(&v) {
        Some(v)
    } else {
        None
    }
}

impl Format for Native {
    fn name(&self) -> &'static str {
        "nrrd"
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["nrrd", "nhdr"]
    }

    fn fits(&self, _nrrd: &Nrrd, _io: &NrrdIoState) -> bool {
        true
    }

    fn sniff(&self, start: &[u8]) -> bool {
        start.starts_with(b"NRRD")
    }

    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "nrrd read";
        *nrrd = Nrrd::new();
        io.seen = 0;
        io.endian = None;
        io.line_skip = 0;
        io.byte_skip = 0;
        io.data_file = None;
        io.data_file_names.clear();

        let magic = util::read_line(src)?
            .ok_or_else(|| NrrdError::parse(format!("{}: empty input", me)))?;
        io.header_version = parse_magic(&magic).ok_or_else(|| {
            NrrdError::parse(format!("{}: bad magic \"{}\"", me, magic))
        })?;

        let mut list_mode = false;
        let mut at_eof = false;
        loop {
            let line = match util::read_line(src)? {
                None => {
                    at_eof = true;
                    break;
                }
                Some(l) => l,
            };
            if line.is_empty() {
                break;
            }
            if list_mode {
                io.data_file_names.push(line);
                continue;
            }
            if let Some(rest) = line.strip_prefix('#') {
                let trimmed = rest.trim();
                if !BOILERPLATE.contains(&trimmed) {
                    nrrd.comment_add(trimmed);
                }
                continue;
            }
            let kv_at = line.find(":=");
            let fv_at = line.find(": ");
            if let Some(k) = kv_at {
                if fv_at.map_or(true, |f| k < f) {
                    let key = util::unescape(&line[..k]);
                    let value = util::unescape(&line[k + 2..]);
                    if key.is_empty() || field::is_reserved_key(&key) {
                        io.warn(format!(
                            "{}: ignoring key/value pair with unusable key \"{}\"",
                            me, key
                        ));
                    } else {
                        nrrd.kvp_add(&key, &value)?;
                    }
                    continue;
                }
            }
            let (name, value) = match fv_at {
                Some(f) => (&line[..f], &line[f + 2..]),
                // "name:" with nothing after is an empty value
                None => match line.strip_suffix(':') {
                    Some(name) => (name, ""),
                    None => {
                        return Err(NrrdError::parse(format!(
                            "{}: \"{}\" is not a field, key/value pair, or comment",
                            me, line
                        )));
                    }
                },
            };
            match Field::from_name(name) {
                None => {
                    io.warn(format!("{}: ignoring unknown field \"{}\"", me, name));
                }
                Some(Field::Comment) => {
                    nrrd.comment_add(value);
                }
                Some(f) => {
                    if io.seen & f.bit() != 0 {
                        io.warn(format!(
                            "{}: field \"{}\" given more than once; last one wins",
                            me,
                            f.name()
                        ));
                    }
                    field::parse_field(nrrd, io, f, value)?;
                    if matches!(io.data_file, Some(DataFileSpec::List { .. }))
                        && f == Field::DataFile
                    {
                        list_mode = true;
                    }
                }
            }
        }

        check_required(nrrd, io)?;
        read_payload(src, nrrd, io, at_eof)?;
        nrrd.check()
    }

    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
        let me = "nrrd write";
        if io.detached_header && io.data_file.is_none() {
            return Err(NrrdError::validation(format!(
                "{}: detached header requested but no data file set",
                me
            )));
        }
        if !io.encoding.available() {
            return Err(NrrdError::unavailable(me, io.encoding.name()));
        }

        let version = needed_version(nrrd, io);
        let mut header = String::new();
        header.push_str(&format!("NRRD000{}\n", version));
        for line in &BOILERPLATE {
            header.push_str(&format!("# {}\n", line));
        }
        for &f in &FIELD_ORDER {
            if let Some(line) = field::field_line(f, nrrd, io) {
                header.push_str(&line);
                header.push('\n');
            }
        }
        for c in &nrrd.comments {
            header.push_str(&format!("# {}\n", c));
        }
        for (k, v) in nrrd.kvps() {
            header.push_str(&format!("{}:={}\n", util::escape(k), util::escape(v)));
        }
        if io.detached_header {
            if let Some(line) = field::field_line(Field::LineSkip, nrrd, io) {
                header.push_str(&line);
                header.push('\n');
            }
            if let Some(line) = field::field_line(Field::ByteSkip, nrrd, io) {
                header.push_str(&line);
                header.push('\n');
            }
            if let Some(line) = field::field_line(Field::DataFile, nrrd, io) {
                header.push_str(&line);
                header.push('\n');
            }
            if matches!(io.data_file, Some(DataFileSpec::List { .. })) {
                for name in &io.data_file_names {
                    header.push_str(name);
                    header.push('\n');
                }
            }
        }
        util::write_all_chunked(dst, header.as_bytes(), me)?;

        // the payload, byte-swapped if a non-native order was asked for
        let swapped;
        let payload: &[u8] = if payload_swaps(nrrd, io) {
            let mut copy = nrrd.data.clone();
            util::swap_endian(&mut copy, nrrd.element_size());
            swapped = copy;
            &swapped
        } else {
            &nrrd.data
        };

        if !io.detached_header {
            util::write_all_chunked(dst, b"\n", me)?;
            return io.encoding.write(dst, payload, nrrd, io);
        }

        let names = resolve_data_files(nrrd, io)?;
        let slab = payload.len() / names.len();
        for (i, name) in names.iter().enumerate() {
            let path = resolve_path(io, name);
            let file = File::create(&path).map_err(|e| {
                NrrdError::from(e)
                    .context(format!("{}: couldn't create \"{}\"", me, path.display()))
            })?;
            let mut out = BufWriter::new(file);
            io.encoding
                .write(&mut out, &payload[i * slab..(i + 1) * slab], nrrd, io)?;
            out.flush()?;
        }
        Ok(())
    }
}

fn payload_swaps(nrrd: &Nrrd, io: &NrrdIoState) -> bool {
    !io.encoding.is_text()
        && nrrd.ty != NrrdType::Block
        && nrrd.element_size() > 1
        && io.write_endian() != Endianness::native()
}

/// Lowest header version able to carry everything this array and I/O
/// state use.
fn needed_version(nrrd: &Nrrd, io: &NrrdIoState) -> u32 {
    let multi_file = matches!(
        io.data_file,
        Some(DataFileSpec::Pattern { .. }) | Some(DataFileSpec::List { .. })
    );
    if multi_file || fp::exists(nrrd.measurement_frame[0][0]) {
        5
    } else if nrrd.space_dim > 0 || nrrd.sample_units.is_some() {
        4
    } else if nrrd.kvp_len() > 0 {
        2
    } else {
        1
    }
}

fn check_required(nrrd: &Nrrd, io: &NrrdIoState) -> Result<()> {
    let me = "nrrd read";
    for f in [Field::Type, Field::Dimension, Field::Sizes, Field::Encoding] {
        if io.seen & f.bit() == 0 {
            return Err(NrrdError::parse(format!(
                "{}: didn't see required field \"{}\"",
                me,
                f.name()
            )));
        }
    }
    if nrrd.ty == NrrdType::Block && io.seen & Field::BlockSize.bit() == 0 {
        return Err(NrrdError::parse(format!(
            "{}: type is block but didn't see \"block size\"",
            me
        )));
    }
    if !io.encoding.is_text()
        && nrrd.ty != NrrdType::Block
        && nrrd.element_size() > 1
        && io.endian.is_none()
    {
        return Err(NrrdError::parse(format!(
            "{}: {} needs the \"endian\" field with {} data",
            me,
            io.encoding.name(),
            nrrd.ty
        )));
    }
    if io.byte_skip != 0 && io.encoding.is_compression() {
        return Err(NrrdError::parse(format!(
            "{}: can't byte skip into a compressed ({}) stream",
            me,
            io.encoding.name()
        )));
    }
    // -1 means "payload size from the end of the file", which only
    // lines up when encoded bytes and element bytes are the same thing
    if io.byte_skip == -1 && io.encoding.name() != "raw" {
        return Err(NrrdError::parse(format!(
            "{}: byte skip -1 only works with raw encoding, not {}",
            me,
            io.encoding.name()
        )));
    }
    Ok(())
}

fn resolve_path(io: &NrrdIoState, name: &str) -> PathBuf {
    match &io.header_dir {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

/// Expand the `data file:` spec into concrete filenames, checking the
/// count against the array shape.
fn resolve_data_files(nrrd: &Nrrd, io: &NrrdIoState) -> Result<Vec<String>> {
    let me = "resolve_data_files";
    let spec = io.data_file.as_ref().ok_or_else(|| {
        NrrdError::parse(format!("{}: no data file specified", me))
    })?;
    let (names, subdim) = match spec {
        DataFileSpec::Single(name) => return Ok(vec![name.clone()]),
        DataFileSpec::Pattern {
            pattern,
            min,
            max,
            step,
            subdim,
        } => {
            let mut names = Vec::new();
            let mut i = *min;
            while (*step > 0 && i <= *max) || (*step < 0 && i >= *max) {
                names.push(expand_pattern(pattern, i)?);
                i += step;
            }
            (names, *subdim)
        }
        DataFileSpec::List { subdim } => {
            if io.data_file_names.is_empty() {
                return Err(NrrdError::parse(format!(
                    "{}: data file LIST with no filenames",
                    me
                )));
            }
            (io.data_file_names.clone(), *subdim)
        }
    };
    let subdim = subdim.unwrap_or_else(|| nrrd.dim().saturating_sub(1).max(1));
    let slab_elems: usize = nrrd.sizes()[..subdim].iter().product();
    let needed = nrrd.element_count() / slab_elems.max(1);
    if names.len() != needed {
        return Err(NrrdError::parse(format!(
            "{}: have {} data files but sizes {:?} with {}-D slabs need {}",
            me,
            names.len(),
            nrrd.sizes(),
            subdim,
            needed
        )));
    }
    Ok(names)
}

/// Substitute `index` into a printf-style `%d`/`%0Nd` filename pattern.
fn expand_pattern(pattern: &str, index: i64) -> Result<String> {
    let me = "expand_pattern";
    let pct = pattern.find('%').ok_or_else(|| {
        NrrdError::parse(format!("{}: no % in pattern \"{}\"", me, pattern))
    })?;
    let tail = &pattern[pct + 1..];
    let digit_len = tail.bytes().take_while(u8::is_ascii_digit).count();
    let (spec, rest) = tail.split_at(digit_len);
    if !rest.starts_with('d') {
        return Err(NrrdError::parse(format!(
            "{}: only %d conversions supported, in \"{}\"",
            me, pattern
        )));
    }
    let zero_pad = spec.starts_with('0');
    let width: usize = if spec.is_empty() {
        0
    } else {
        spec.parse().map_err(|_| {
            NrrdError::parse(format!("{}: bad width in \"{}\"", me, pattern))
        })?
    };
    let formatted = if zero_pad {
        format!("{:0width$}", index, width = width)
    } else {
        format!("{:width$}", index, width = width)
    };
    Ok(format!("{}{}{}", &pattern[..pct], formatted, &rest[1..]))
}

fn skip_input(src: &mut dyn DataInput, io: &NrrdIoState, payload_bytes: usize) -> Result<()> {
    if io.line_skip > 0 {
        util::skip_lines(src, io.line_skip)?;
    }
    if io.byte_skip > 0 {
        util::skip_bytes(src, io.byte_skip as u64)?;
    } else if io.byte_skip == -1 {
        src.skip_from_end(payload_bytes as u64)?;
    }
    Ok(())
}

fn read_payload(
    src: &mut dyn DataInput,
    nrrd: &mut Nrrd,
    io: &mut NrrdIoState,
    header_at_eof: bool,
) -> Result<()> {
    let me = "nrrd read";
    let total = nrrd
        .checked_byte_count()
        .ok_or_else(|| NrrdError::parse(format!("{}: byte count overflows", me)))?;
    let mut data = vec![0u8; total];

    match io.data_file {
        None => {
            if header_at_eof {
                return Err(NrrdError::parse(format!(
                    "{}: header ended with neither payload nor data file",
                    me
                )));
            }
            skip_input(src, io, total)?;
            io.encoding.read(src, &mut data, nrrd, io)?;
        }
        Some(_) => {
            let names = resolve_data_files(nrrd, io)?;
            let slab = total / names.len();
            for (i, name) in names.iter().enumerate() {
                let path = resolve_path(io, name);
                let file = File::open(&path).map_err(|e| {
                    NrrdError::from(e)
                        .context(format!("{}: couldn't open \"{}\"", me, path.display()))
                })?;
                let mut part = Seekable(BufReader::new(file));
                skip_input(&mut part, io, slab)?;
                io.encoding
                    .read(&mut part, &mut data[i * slab..(i + 1) * slab], nrrd, io)
                    .map_err(|e| {
                        e.context(format!(
                            "{}: trouble with data file \"{}\"",
                            me,
                            path.display()
                        ))
                    })?;
            }
        }
    }

    if !io.encoding.is_text() && nrrd.ty != NrrdType::Block && nrrd.element_size() > 1 {
        if let Some(e) = io.endian {
            if e != Endianness::native() {
                util::swap_endian(&mut data, nrrd.element_size());
            }
        }
    }
    nrrd.data = data;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::Unseekable;
    use std::io::Cursor;

    fn read_str(header: &str) -> Result<(Nrrd, NrrdIoState)> {
        let mut io = NrrdIoState::new();
        let mut nrrd = Nrrd::new();
        let mut src = Unseekable(Cursor::new(header.as_bytes().to_vec()));
        Native.read(&mut src, &mut nrrd, &mut io)?;
        Ok((nrrd, io))
    }

    #[test]
    fn magic_versions() {
        assert_eq!(parse_magic("NRRD0001"), Some(1));
        assert_eq!(parse_magic("NRRD0005"), Some(5));
        assert_eq!(parse_magic("NRRD00.01"), Some(1));
        assert_eq!(parse_magic("NRRD0006"), None);
        assert_eq!(parse_magic("NRRD0000"), None);
        assert_eq!(parse_magic("NRD0001"), None);
    }

    #[test]
    fn minimal_ascii_file() {
        let (nrrd, _) = read_str(
            "NRRD0001\n\
             # a comment\n\
             type: uchar\n\
             dimension: 2\n\
             sizes: 3 2\n\
             encoding: ascii\n\
             \n\
             1 2 3\n\
             4 5 6\n",
        )
        .unwrap();
        assert_eq!(nrrd.ty, NrrdType::Uint8);
        assert_eq!(nrrd.sizes(), vec![3, 2]);
        assert_eq!(nrrd.values::<u8>().unwrap(), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(nrrd.comments, vec!["a comment".to_string()]);
    }

    #[test]
    fn key_value_and_unknown_field() {
        let (nrrd, io) = read_str(
            "NRRD0002\n\
             type: uchar\n\
             dimension: 1\n\
             sizes: 2\n\
             encoding: ascii\n\
             modality:=CT\n\
             multi\\nline:=a\\\\b\n\
             flavor: chocolate\n\
             \n\
             7 8\n",
        )
        .unwrap();
        assert_eq!(nrrd.kvp_get("modality"), Some("CT"));
        assert_eq!(nrrd.kvp_get("multi\nline"), Some("a\\b"));
        assert_eq!(io.warnings.len(), 1);
        assert!(io.warnings[0].contains("flavor"));
    }

    #[test]
    fn missing_required_field() {
        let err = read_str(
            "NRRD0001\n\
             type: uchar\n\
             sizes: 2\n\
             encoding: ascii\n\
             \n\
             7 8\n",
        )
        .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("dimension"), "got: {}", msg);
    }

    #[test]
    fn byte_skip_into_compressed_stream_is_rejected() {
        let err = read_str(
            "NRRD0001\n\
             type: uchar\n\
             dimension: 1\n\
             sizes: 1\n\
             encoding: gzip\n\
             byte skip: 5\n\
             \n",
        )
        .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("compressed"), "got: {}", msg);
    }

    #[test]
    fn absurd_sizes_are_rejected() {
        let err = read_str(
            "NRRD0001\n\
             type: uchar\n\
             dimension: 3\n\
             sizes: 5000000000 5000000000 5000000000\n\
             encoding: raw\n\
             \n",
        )
        .unwrap_err();
        let msg = format!("{}", err);
        assert!(msg.contains("overflows"), "got: {}", msg);
    }

    #[test]
    fn endian_required_for_binary_multibyte() {
        let err = read_str(
            "NRRD0001\n\
             type: short\n\
             dimension: 1\n\
             sizes: 1\n\
             encoding: raw\n\
             \n\
             \u{0}\u{1}",
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("endian"));
    }

    #[test]
    fn line_skip_in_attached_payload() {
        let (nrrd, _) = read_str(
            "NRRD0001\n\
             type: uchar\n\
             dimension: 1\n\
             sizes: 3\n\
             encoding: ascii\n\
             line skip: 2\n\
             \n\
             junk junk junk\n\
             more junk\n\
             9 8 7\n",
        )
        .unwrap();
        assert_eq!(nrrd.values::<u8>().unwrap(), vec![9, 8, 7]);
    }

    #[test]
    fn endian_swap_on_read() {
        let big = if cfg!(target_endian = "little") {
            "big"
        } else {
            "little"
        };
        let header = format!(
            "NRRD0001\ntype: ushort\ndimension: 1\nsizes: 2\nencoding: raw\nendian: {}\n\n",
            big
        );
        let mut bytes = header.into_bytes();
        // 0x0102, 0x0304 in the foreign order
        bytes.extend_from_slice(&[0x01, 0x02, 0x03, 0x04]);
        let mut io = NrrdIoState::new();
        let mut nrrd = Nrrd::new();
        let mut src = Unseekable(Cursor::new(bytes));
        Native.read(&mut src, &mut nrrd, &mut io).unwrap();
        assert_eq!(nrrd.values::<u16>().unwrap(), vec![0x0102, 0x0304]);
    }

    #[test]
    fn write_then_read_attached() {
        let mut nrrd = Nrrd::from_vec(vec![1.0f32, 2.0, 3.0, 4.0], &[2, 2]).unwrap();
        nrrd.axes[0].spacing = 0.5;
        nrrd.kvp_add("who", "tester").unwrap();
        nrrd.comment_add("hello");

        let mut io = NrrdIoState::new();
        let mut bytes = Vec::new();
        Native.write(&mut bytes, &nrrd, &mut io).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("NRRD0002\n"), "got: {}", text);
        assert!(text.contains("spacings: 0.5 nan"));
        assert!(text.contains("who:=tester"));

        let mut io2 = NrrdIoState::new();
        let mut back = Nrrd::new();
        let mut src = Unseekable(Cursor::new(bytes));
        Native.read(&mut src, &mut back, &mut io2).unwrap();
        assert_eq!(back.values::<f32>().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(back.kvp_get("who"), Some("tester"));
        // boilerplate comments don't accumulate
        assert_eq!(back.comments, vec!["hello".to_string()]);
        assert_eq!(back.axes[0].spacing, 0.5);
    }

    #[test]
    fn version_selection() {
        let io = NrrdIoState::new();
        let mut nrrd = Nrrd::from_vec(vec![0u8; 4], &[4]).unwrap();
        assert_eq!(needed_version(&nrrd, &io), 1);
        nrrd.kvp_add("a", "b").unwrap();
        assert_eq!(needed_version(&nrrd, &io), 2);
        nrrd.space_dim = 3;
        assert_eq!(needed_version(&nrrd, &io), 4);
        nrrd.measurement_frame[0][0] = 1.0;
        assert_eq!(needed_version(&nrrd, &io), 5);
    }

    #[test]
    fn pattern_expansion() {
        assert_eq!(expand_pattern("z%03d.raw", 7).unwrap(), "z007.raw");
        assert_eq!(expand_pattern("z%d.raw", 42).unwrap(), "z42.raw");
        assert_eq!(expand_pattern("%04d", -3).unwrap(), "-003");
        assert!(expand_pattern("plain.raw", 0).is_err());
        assert!(expand_pattern("z%s.raw", 0).is_err());
    }

    #[test]
    fn byte_skip_minus_one_rejects_compression() {
        let err = read_str(
            "NRRD0001\n\
             type: uchar\n\
             dimension: 1\n\
             sizes: 2\n\
             encoding: gzip\n\
             byte skip: -1\n\
             \n",
        )
        .unwrap_err();
        assert!(format!("{}", err).contains("byte skip -1"));
    }
}
