//! Reading and writing arrays: the [`NrrdIoState`] parameter block and
//! the [`load`]/[`save`] drivers that pick a container format and run it.

use crate::encoding::{self, NrrdEncoding};
use crate::error::{NrrdError, Result};
use crate::format::{self, Format};
use crate::object::Nrrd;
use crate::util::{DataInput, Seekable, Unseekable};
use byteordered::Endianness;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// How the payload is distributed over files, from the `data file:`
/// header field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataFileSpec {
    /// One detached data file.
    Single(String),
    /// A printf-style filename pattern covering a range of slice
    /// indices. `subdim` is the rank of the array held by each file;
    /// it defaults to one less than the full rank.
    Pattern {
        pattern: String,
        min: i64,
        max: i64,
        step: i64,
        subdim: Option<usize>,
    },
    /// Explicit filenames, listed one per line after the field.
    List { subdim: Option<usize> },
}

/// Everything about an I/O operation that is not part of the array
/// itself: encoding, endianness, skip amounts, detached-data layout and
/// tuning knobs. A default state reads and writes attached raw data.
pub struct NrrdIoState {
    /// Directory the header was read from (or will be written to);
    /// detached data filenames are resolved against it.
    pub header_dir: Option<PathBuf>,
    /// Write the header and payload to separate files.
    pub detached_header: bool,
    /// Payload encoding.
    pub encoding: &'static dyn NrrdEncoding,
    /// Byte order of the payload. `None` means native (writing) or
    /// not-yet-seen (reading).
    pub endian: Option<Endianness>,
    /// Text lines to skip before the payload, per data file.
    pub line_skip: usize,
    /// Bytes to skip after line skipping, per data file; -1 means
    /// "seek so that exactly the payload remains", which needs a
    /// seekable uncompressed source.
    pub byte_skip: i64,
    /// Detached payload layout.
    pub data_file: Option<DataFileSpec>,
    /// Filenames accumulated for [`DataFileSpec::List`].
    pub data_file_names: Vec<String>,
    /// Line-width target for text encodings.
    pub chars_per_line: usize,
    /// Write plain-text files with no comment lines at all, losing any
    /// metadata beyond the values.
    pub bare_text: bool,
    /// gzip compression level (0-9), `None` for the library default.
    pub zlib_level: Option<u32>,
    /// bzip2 block size (1-9), `None` for the library default.
    pub bzip2_block_size: Option<u32>,
    /// 0 is silent; at 1 and up, warnings also go to stderr.
    pub verbose: u32,
    /// Non-fatal oddities noticed while reading or writing.
    pub warnings: Vec<String>,
    /// Bitmask over [`crate::format::field::Field`] of fields seen so
    /// far in the current header.
    pub(crate) seen: u64,
    /// File format version of the header being read.
    pub(crate) header_version: u32,
}

impl Default for NrrdIoState {
    fn default() -> NrrdIoState {
        NrrdIoState {
            header_dir: None,
            detached_header: false,
            encoding: &encoding::Raw,
            endian: None,
            line_skip: 0,
            byte_skip: 0,
            data_file: None,
            data_file_names: Vec::new(),
            chars_per_line: 75,
            bare_text: true,
            zlib_level: None,
            bzip2_block_size: None,
            verbose: 0,
            warnings: Vec::new(),
            seen: 0,
            header_version: 0,
        }
    }
}

impl fmt::Debug for NrrdIoState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NrrdIoState")
            .field("header_dir", &self.header_dir)
            .field("detached_header", &self.detached_header)
            .field("encoding", &self.encoding.name())
            .field("endian", &self.endian)
            .field("line_skip", &self.line_skip)
            .field("byte_skip", &self.byte_skip)
            .field("data_file", &self.data_file)
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl NrrdIoState {
    /// Fresh state for reading or writing one array.
    pub fn new() -> NrrdIoState {
        NrrdIoState::default()
    }

    /// Record a non-fatal oddity.
    pub fn warn(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.verbose >= 1 {
            eprintln!("nrrd warning: {}", msg);
        }
        self.warnings.push(msg);
    }

    /// Byte order the payload will be written in.
    pub(crate) fn write_endian(&self) -> Endianness {
        self.endian.unwrap_or_else(Endianness::native)
    }
}

/// Sniff the format of `src` and read one array from it.
pub(crate) fn read_any(
    src: &mut dyn DataInput,
    nrrd: &mut Nrrd,
    io: &mut NrrdIoState,
) -> Result<()> {
    let start = src.fill_buf()?.to_vec();
    let fmt = format::formats()
        .iter()
        .copied()
        .find(|f| f.available() && f.sniff(&start))
        .ok_or_else(|| {
            NrrdError::parse("read: couldn't recognize the format of the input".to_string())
        })?;
    fmt.read(src, nrrd, io)
}

/// Read an array from a file, recognizing the format from its content.
pub fn load(path: impl AsRef<Path>) -> Result<Nrrd> {
    load_with(path, &mut NrrdIoState::new())
}

/// [`load`], with caller-controlled I/O state (and access to any
/// warnings afterwards).
pub fn load_with(path: impl AsRef<Path>, io: &mut NrrdIoState) -> Result<Nrrd> {
    let me = "load";
    let path = path.as_ref();
    io.header_dir = path.parent().map(Path::to_path_buf);
    let file = File::open(path)
        .map_err(|e| NrrdError::from(e).context(format!("{}: couldn't open \"{}\"", me, path.display())))?;
    let mut src = Seekable(BufReader::new(file));
    let mut nrrd = Nrrd::new();
    read_any(&mut src, &mut nrrd, io)
        .map_err(|e| e.context(format!("{}: trouble reading \"{}\"", me, path.display())))?;
    Ok(nrrd)
}

/// Write an array to a file; the extension picks the format, anything
/// unrecognized gets the native format.
pub fn save(path: impl AsRef<Path>, nrrd: &Nrrd) -> Result<()> {
    save_with(path, nrrd, &mut NrrdIoState::new())
}

/// [`save`], with caller-controlled I/O state.
pub fn save_with(path: impl AsRef<Path>, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()> {
    let me = "save";
    let path = path.as_ref();
    nrrd.check()
        .map_err(|e| e.context(format!("{}: won't write an invalid array", me)))?;

    let mut fmt = format::from_extension(path).unwrap_or(&format::Native);
    if !fmt.available() {
        io.warn(format!(
            "{}: {} format not compiled in; saving as nrrd",
            me,
            fmt.name()
        ));
        fmt = &format::Native;
    } else if !fmt.fits(nrrd, io) {
        io.warn(format!(
            "{}: this array doesn't fit in the {} format; saving as nrrd",
            me,
            fmt.name()
        ));
        fmt = &format::Native;
    }

    io.header_dir = path.parent().map(Path::to_path_buf);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    if ext.as_deref() == Some("nhdr") {
        io.detached_header = true;
        if io.data_file.is_none() {
            io.data_file = Some(DataFileSpec::Single(default_data_file_name(path, io)?));
        }
    }

    let file = File::create(path)
        .map_err(|e| NrrdError::from(e).context(format!("{}: couldn't create \"{}\"", me, path.display())))?;
    let mut dst = BufWriter::new(file);
    fmt.write(&mut dst, nrrd, io)
        .map_err(|e| e.context(format!("{}: trouble writing \"{}\"", me, path.display())))?;
    dst.flush()?;
    Ok(())
}

/// Data filename to go with a detached header: the header's base name
/// with an extension matching the encoding.
fn default_data_file_name(header: &Path, io: &NrrdIoState) -> Result<String> {
    let stem = header
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| {
            NrrdError::validation(format!(
                "save: can't derive a data filename from \"{}\"",
                header.display()
            ))
        })?;
    Ok(format!("{}.{}", stem, io.encoding.suffix()))
}

impl Nrrd {
    /// Read an array from a file. See [`load`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Nrrd> {
        load(path)
    }

    /// Read an array from a stream, recognizing the format from its
    /// content. Tail-relative byte skipping (`byte skip: -1`) and
    /// detached data files are not possible here; use [`load`] for
    /// those.
    pub fn from_reader(reader: impl BufRead) -> Result<Nrrd> {
        let mut src = Unseekable(reader);
        let mut nrrd = Nrrd::new();
        read_any(&mut src, &mut nrrd, &mut NrrdIoState::new())?;
        Ok(nrrd)
    }

    /// Write the array to a file. See [`save`].
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        save(path, self)
    }

    /// Write the array to a stream in the native format.
    pub fn write_to(&self, mut writer: impl Write, io: &mut NrrdIoState) -> Result<()> {
        self.check()?;
        format::Native.write(&mut writer, self, io)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state() {
        let io = NrrdIoState::new();
        assert_eq!(io.encoding.name(), "raw");
        assert_eq!(io.chars_per_line, 75);
        assert_eq!(io.byte_skip, 0);
        assert!(!io.detached_header);
    }

    #[test]
    fn warnings_accumulate() {
        let mut io = NrrdIoState::new();
        io.warn("first");
        io.warn("second");
        assert_eq!(io.warnings, vec!["first", "second"]);
    }

    #[test]
    fn data_file_names() {
        let mut io = NrrdIoState::new();
        io.encoding = &crate::encoding::Gzip;
        assert_eq!(
            default_data_file_name(Path::new("dir/vol.nhdr"), &io).unwrap(),
            "vol.raw.gz"
        );
        io.encoding = &crate::encoding::Raw;
        assert_eq!(
            default_data_file_name(Path::new("vol.nhdr"), &io).unwrap(),
            "vol.raw"
        );
    }
}
