//! Rust library for N-dimensional raster data in the NRRD file format.
//!
//! A [`Nrrd`] couples a typed N-dimensional array (up to [`DIM_MAX`]
//! axes) with per-axis metadata: sample spacing, world-space bounds and
//! direction vectors, centering, semantic kind, labels and units, plus
//! array-wide orientation, comments and key/value pairs. Missing
//! floating-point metadata is represented as NaN; see [`fp`] for the
//! existence discipline.
//!
//! Files pair a text header with a payload that may live in the same
//! file, a detached file, or a series of files. Five payload encodings
//! (raw, ascii, hex, gzip, bzip2) combine with the container formats:
//! the native format plus PNM, PNG, VTK, plain text and (write-only)
//! EPS.
//!
//! # Example
//!
//! ```no_run
//! use nrrd::{Nrrd, NrrdType};
//!
//! # fn run() -> nrrd::Result<()> {
//! let volume = nrrd::load("scan.nhdr")?;
//! assert_eq!(volume.ty, NrrdType::Int16);
//! println!("{}-D, spacing {:?}", volume.dim(),
//!          volume.axes.iter().map(|a| a.spacing).collect::<Vec<_>>());
//!
//! let mask = Nrrd::from_vec(vec![0u8; volume.element_count()], &volume.sizes())?;
//! nrrd::save("mask.nrrd", &mask)?;
//! # Ok(())
//! # }
//! ```
//!
//! Errors are reported twice: as [`NrrdError`] values, and as message
//! stacks keyed per domain in [`biff`], where layered operations push
//! context frames the way the diagnostics of larger pipelines expect.

#[macro_use]
extern crate num_derive;
#[macro_use]
extern crate quick_error;

#[cfg(feature = "ndarray_volumes")]
mod array;
pub mod axis;
pub mod biff;
pub mod encoding;
mod error;
pub mod format;
pub mod fp;
mod io;
mod object;
pub mod typedef;
mod util;

pub use crate::axis::{Axis, DIM_MAX, SPACE_DIM_MAX};
pub use crate::error::{NrrdError, Result};
pub use crate::fp::{exists, sanity, FpClass, Sanity};
pub use crate::io::{load, load_with, save, save_with, DataFileSpec, NrrdIoState};
pub use crate::object::{basic_info, Nrrd};
pub use crate::typedef::{AxisKind, Centering, NrrdElement, NrrdType, Space};
pub use crate::util::{DataInput, Seekable, Unseekable};
