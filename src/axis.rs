//! Per-axis metadata.

use crate::fp;
use crate::typedef::{AxisKind, Centering};

/// Highest array rank this crate will represent.
pub const DIM_MAX: usize = 16;

/// Highest world-space dimension this crate will represent.
pub const SPACE_DIM_MAX: usize = 8;

/// Selection bits for [`crate::Nrrd::axis_info_copy`].
pub mod info {
    /// Axis extent.
    pub const SIZE: u32 = 1 << 0;
    /// World-unit distance between samples.
    pub const SPACING: u32 = 1 << 1;
    /// Slice thickness.
    pub const THICKNESS: u32 = 1 << 2;
    /// Lower world bound.
    pub const MIN: u32 = 1 << 3;
    /// Upper world bound.
    pub const MAX: u32 = 1 << 4;
    /// World-space step vector.
    pub const SPACE_DIRECTION: u32 = 1 << 5;
    /// Sample centering.
    pub const CENTER: u32 = 1 << 6;
    /// Semantic kind.
    pub const KIND: u32 = 1 << 7;
    /// Axis label.
    pub const LABEL: u32 = 1 << 8;
    /// Axis units.
    pub const UNITS: u32 = 1 << 9;
    /// Every per-axis field.
    pub const ALL: u32 = SIZE
        | SPACING
        | THICKNESS
        | MIN
        | MAX
        | SPACE_DIRECTION
        | CENTER
        | KIND
        | LABEL
        | UNITS;
}

/// Metadata for one axis of an array. Floating-point fields use NaN for
/// "missing" (see [`crate::fp::exists`]).
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Number of samples along this axis.
    pub size: usize,
    /// World-unit distance between adjacent samples.
    pub spacing: f64,
    /// Thickness of the region represented by one sample.
    pub thickness: f64,
    /// Lower world coordinate bound.
    pub min: f64,
    /// Upper world coordinate bound.
    pub max: f64,
    /// World-space change of position for a unit index increment, one
    /// component per space dimension. All-NaN on non-spatial axes.
    pub space_direction: [f64; SPACE_DIM_MAX],
    /// Sample centering.
    pub center: Centering,
    /// Semantic role of the axis.
    pub kind: AxisKind,
    /// Optional description.
    pub label: Option<String>,
    /// Optional units of the world space of this axis.
    pub units: Option<String>,
}

impl Default for Axis {
    fn default() -> Axis {
        Axis {
            size: 0,
            spacing: fp::nan(),
            thickness: fp::nan(),
            min: fp::nan(),
            max: fp::nan(),
            space_direction: [fp::nan(); SPACE_DIM_MAX],
            center: Centering::Unknown,
            kind: AxisKind::Unknown,
            label: None,
            units: None,
        }
    }
}

impl Axis {
    /// New axis of the given size, everything else missing.
    pub fn sized(size: usize) -> Axis {
        Axis {
            size,
            ..Axis::default()
        }
    }

    /// Whether this axis has a world-space direction vector (is spatial).
    pub fn has_space_direction(&self, space_dim: usize) -> bool {
        space_dim > 0 && fp::exists(self.space_direction[0])
    }

    /// World position of sample `idx`, from `min`/`max` and the
    /// centering (node centering assumed when unknown). NaN when the
    /// bounds are missing.
    pub fn pos(&self, idx: f64) -> f64 {
        let size = self.size as f64;
        match self.center {
            Centering::Cell => {
                self.min + (idx + 0.5) * (self.max - self.min) / size
            }
            _ => {
                if self.size == 1 {
                    (self.min + self.max) / 2.0
                } else {
                    self.min + idx * (self.max - self.min) / (size - 1.0)
                }
            }
        }
    }

    /// Copy the fields selected by `bits` (see [`info`]) from `src`.
    /// `size` is only copied when its bit is set.
    pub fn copy_info(&mut self, src: &Axis, bits: u32) {
        if bits & info::SIZE != 0 {
            self.size = src.size;
        }
        if bits & info::SPACING != 0 {
            self.spacing = src.spacing;
        }
        if bits & info::THICKNESS != 0 {
            self.thickness = src.thickness;
        }
        if bits & info::MIN != 0 {
            self.min = src.min;
        }
        if bits & info::MAX != 0 {
            self.max = src.max;
        }
        if bits & info::SPACE_DIRECTION != 0 {
            self.space_direction = src.space_direction;
        }
        if bits & info::CENTER != 0 {
            self.center = src.center;
        }
        if bits & info::KIND != 0 {
            self.kind = src.kind;
        }
        if bits & info::LABEL != 0 {
            self.label = src.label.clone();
        }
        if bits & info::UNITS != 0 {
            self.units = src.units.clone();
        }
    }
}
