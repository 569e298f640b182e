//! Container formats: how a header-plus-payload becomes a file. The
//! native format carries everything; the foreign formats (PNM, PNG, VTK,
//! plain text, EPS) carry what they can and smuggle the rest inside
//! comments or text chunks where the format allows it.

use crate::error::Result;
use crate::io::NrrdIoState;
use crate::object::Nrrd;
use crate::util::DataInput;
use std::io::Write;

pub(crate) mod field;

mod eps;
mod nrrd;
mod pnm;
#[cfg(feature = "png_format")]
mod png;
mod text;
mod vtk;

pub use self::eps::Eps;
pub use self::nrrd::Native;
pub use self::pnm::Pnm;
#[cfg(feature = "png_format")]
pub use self::png::Png;
pub use self::text::Text;
pub use self::vtk::Vtk;

/// One container format.
pub trait Format: Sync {
    /// Name used in diagnostics and format selection.
    fn name(&self) -> &'static str;

    /// File extensions (lowercase, without dot) this format claims.
    fn extensions(&self) -> &'static [&'static str];

    /// Whether support was compiled in.
    fn available(&self) -> bool {
        true
    }

    /// Whether this format can represent the given array. Formats that
    /// cannot are skipped during extension-based selection.
    fn fits(&self, nrrd: &Nrrd, io: &NrrdIoState) -> bool;

    /// Whether `start` (the first bytes of a stream) looks like this
    /// format. Used when the format is not known from the file name.
    fn sniff(&self, start: &[u8]) -> bool;

    /// Read a complete array (header and payload) from `src`.
    fn read(&self, src: &mut dyn DataInput, nrrd: &mut Nrrd, io: &mut NrrdIoState) -> Result<()>;

    /// Write a complete array to `dst`.
    fn write(&self, dst: &mut dyn Write, nrrd: &Nrrd, io: &mut NrrdIoState) -> Result<()>;
}

/// Every format, in sniffing order. Text goes last: its "magic" is just
/// a line of numbers, so anything more specific must get the first look.
pub fn formats() -> &'static [&'static dyn Format] {
    #[cfg(feature = "png_format")]
    {
        &[&Native, &Pnm, &Png, &Vtk, &Eps, &Text]
    }
    #[cfg(not(feature = "png_format"))]
    {
        &[&Native, &Pnm, &Vtk, &Eps, &Text]
    }
}

/// Resolve a format by name.
pub fn from_name(name: &str) -> Option<&'static dyn Format> {
    let lower = name.trim().to_ascii_lowercase();
    formats().iter().copied().find(|f| f.name() == lower)
}

/// Pick the format that claims the extension of `path`, if any.
pub fn from_extension(path: &std::path::Path) -> Option<&'static dyn Format> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    formats()
        .iter()
        .copied()
        .find(|f| f.extensions().contains(&ext.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn extension_lookup() {
        assert_eq!(from_extension(Path::new("a/b.nrrd")).unwrap().name(), "nrrd");
        assert_eq!(from_extension(Path::new("x.NHDR")).unwrap().name(), "nrrd");
        assert_eq!(from_extension(Path::new("x.pgm")).unwrap().name(), "pnm");
        assert_eq!(from_extension(Path::new("x.txt")).unwrap().name(), "text");
        assert_eq!(from_extension(Path::new("x.eps")).unwrap().name(), "eps");
        assert!(from_extension(Path::new("x.doc")).is_none());
    }

    #[test]
    fn name_lookup() {
        assert_eq!(from_name("nrrd").unwrap().name(), "nrrd");
        assert_eq!(from_name("VTK").unwrap().name(), "vtk");
        assert!(from_name("tiff").is_none());
    }
}
