//! Types defined by the NRRD format: the scalar element types and the
//! closed enums used in per-axis and space metadata.
//!
//! `NrrdType` doubles as the run-time function table of the format:
//! parsing, printing, indexed lookup/insert and range clamping all
//! dispatch on it, so code paths that only learn the element type from a
//! header can still move values around. Statically-typed access goes
//! through the [`NrrdElement`] trait instead.

use crate::error::{NrrdError, Result};
use crate::fp;
use std::fmt;

/// Data type for representing the element type of an array.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NrrdType {
    /// Type not (yet) known; the state of a freshly created array.
    Unknown = 0,
    /// signed 8-bit integer
    Int8 = 1,
    /// unsigned 8-bit integer
    Uint8 = 2,
    /// signed 16-bit integer
    Int16 = 3,
    /// unsigned 16-bit integer
    Uint16 = 4,
    /// signed 32-bit integer
    Int32 = 5,
    /// unsigned 32-bit integer
    Uint32 = 6,
    /// signed 64-bit integer
    Int64 = 7,
    /// unsigned 64-bit integer
    Uint64 = 8,
    /// 32-bit float
    Float = 9,
    /// 64-bit float
    Double = 10,
    /// opaque chunk of bytes; the size of one element is carried by the
    /// array, not the type
    Block = 11,
}

impl NrrdType {
    /// Size of one element of this type in bytes; 0 for [`NrrdType::Block`],
    /// whose element size lives on the array.
    pub fn size_of(self) -> usize {
        use NrrdType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Int32 | Uint32 | Float => 4,
            Int64 | Uint64 | Double => 8,
            Block | Unknown => 0,
        }
    }

    /// Canonical name, as written in headers.
    pub fn name(self) -> &'static str {
        use NrrdType::*;
        match self {
            Unknown => "???",
            Int8 => "int8",
            Uint8 => "uint8",
            Int16 => "int16",
            Uint16 => "uint16",
            Int32 => "int32",
            Uint32 => "uint32",
            Int64 => "int64",
            Uint64 => "uint64",
            Float => "float",
            Double => "double",
            Block => "block",
        }
    }

    /// Recognize a type name, including every alias the format admits
    /// (`signed char`, `unsigned short int`, `long long`, ...).
    pub fn from_name(name: &str) -> Option<NrrdType> {
        use NrrdType::*;
        let name = name.trim().to_ascii_lowercase();
        Some(match name.as_str() {
            "int8" | "signed char" | "int8_t" | "char" => Int8,
            "uint8" | "uchar" | "unsigned char" | "uint8_t" => Uint8,
            "int16" | "short" | "short int" | "signed short" | "signed short int"
            | "int16_t" => Int16,
            "uint16" | "ushort" | "unsigned short" | "unsigned short int" | "uint16_t" => Uint16,
            "int32" | "int" | "signed int" | "int32_t" => Int32,
            "uint32" | "uint" | "unsigned int" | "uint32_t" => Uint32,
            "int64" | "longlong" | "long long" | "long long int" | "signed long long"
            | "signed long long int" | "int64_t" => Int64,
            "uint64" | "ulonglong" | "unsigned long long" | "unsigned long long int"
            | "uint64_t" => Uint64,
            "???" | "unknown" => Unknown,
            "float" => Float,
            "double" => Double,
            "block" => Block,
            _ => return None,
        })
    }

    /// Whether this is one of the integral types.
    pub fn is_integral(self) -> bool {
        !matches!(
            self,
            NrrdType::Float | NrrdType::Double | NrrdType::Block | NrrdType::Unknown
        )
    }

    /// Widest printed form of a value of this type, used to decide how
    /// many values fit on one line of ascii output.
    pub(crate) fn max_print_width(self) -> usize {
        use NrrdType::*;
        match self {
            Int8 => 4,
            Uint8 => 3,
            Int16 => 6,
            Uint16 => 5,
            Int32 => 11,
            Uint32 => 10,
            Int64 | Uint64 => 20,
            Float => 16,
            Double | Block | Unknown => 25,
        }
    }
}

impl fmt::Display for NrrdType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! scalar_dispatch {
    ($ty:expr, $T:ident => $body:expr, $other:expr) => {
        match $ty {
            NrrdType::Int8 => {
                type $T = i8;
                $body
            }
            NrrdType::Uint8 => {
                type $T = u8;
                $body
            }
            NrrdType::Int16 => {
                type $T = i16;
                $body
            }
            NrrdType::Uint16 => {
                type $T = u16;
                $body
            }
            NrrdType::Int32 => {
                type $T = i32;
                $body
            }
            NrrdType::Uint32 => {
                type $T = u32;
                $body
            }
            NrrdType::Int64 => {
                type $T = i64;
                $body
            }
            NrrdType::Uint64 => {
                type $T = u64;
                $body
            }
            NrrdType::Float => {
                type $T = f32;
                $body
            }
            NrrdType::Double => {
                type $T = f64;
                $body
            }
            NrrdType::Block | NrrdType::Unknown => $other,
        }
    };
}

impl NrrdType {
    /// Parse one ascii token of this type and append its native bytes to
    /// `out`. Not meaningful for `block`.
    pub fn parse_value(self, token: &str, out: &mut Vec<u8>) -> Result<()> {
        scalar_dispatch!(self, T => {
            let v = <T as NrrdElement>::parse_token(token).ok_or_else(|| {
                NrrdError::parse(format!(
                    "parse_value: couldn't parse \"{}\" as {}",
                    token, self
                ))
            })?;
            out.extend_from_slice(bytemuck::bytes_of(&v));
            Ok(())
        }, Err(NrrdError::unsupported(
            "parse_value: block type has no ascii form".to_string(),
        )))
    }

    /// Print the element at index `idx` of a native byte buffer.
    /// Not meaningful for `block`.
    pub fn format_value(self, data: &[u8], idx: usize) -> Result<String> {
        scalar_dispatch!(self, T => {
            let s = self.size_of();
            let v: T = bytemuck::pod_read_unaligned(&data[idx * s..(idx + 1) * s]);
            Ok(<T as NrrdElement>::format_token(v))
        }, Err(NrrdError::unsupported(
            "format_value: block type has no ascii form".to_string(),
        )))
    }

    /// Read the element at index `idx` as a double. Not meaningful for
    /// `block`, which yields NaN.
    pub fn lookup_f64(self, data: &[u8], idx: usize) -> f64 {
        scalar_dispatch!(self, T => {
            let s = self.size_of();
            let v: T = bytemuck::pod_read_unaligned(&data[idx * s..(idx + 1) * s]);
            <T as NrrdElement>::to_f64(v)
        }, fp::nan())
    }

    /// Store a double into the element at index `idx`, converting with
    /// `as`-cast semantics. No-op for `block`.
    pub fn insert_f64(self, data: &mut [u8], idx: usize, value: f64) {
        scalar_dispatch!(self, T => {
            let s = self.size_of();
            let v = <T as NrrdElement>::from_f64(value);
            data[idx * s..(idx + 1) * s].copy_from_slice(bytemuck::bytes_of(&v));
        }, ())
    }

    /// Clamp a double into the representable range of this type.
    /// Floating types pass every value through; for the integral types a
    /// NaN clamps to 0.
    pub fn clamp_f64(self, value: f64) -> f64 {
        use NrrdType::*;
        if !self.is_integral() {
            return value;
        }
        if !fp::exists(value) && value.is_nan() {
            return 0.0;
        }
        let (lo, hi) = match self {
            Int8 => (i8::MIN as f64, i8::MAX as f64),
            Uint8 => (0.0, u8::MAX as f64),
            Int16 => (i16::MIN as f64, i16::MAX as f64),
            Uint16 => (0.0, u16::MAX as f64),
            Int32 => (i32::MIN as f64, i32::MAX as f64),
            Uint32 => (0.0, u32::MAX as f64),
            Int64 => (i64::MIN as f64, i64::MAX as f64),
            Uint64 => (0.0, u64::MAX as f64),
            Float | Double | Block | Unknown => unreachable!(),
        };
        value.max(lo).min(hi)
    }
}

/// An element type an array can be statically viewed as.
///
/// The `Pod` bound is what makes `Nrrd::as_slice` safe: every bit
/// pattern of these types is a valid value.
pub trait NrrdElement: bytemuck::Pod + PartialEq + fmt::Debug + 'static {
    /// The corresponding run-time type tag.
    const TYPE: NrrdType;

    /// Parse one whitespace-delimited ascii token.
    fn parse_token(token: &str) -> Option<Self>;

    /// Print a value the way the ascii encoding writes it.
    fn format_token(v: Self) -> String;

    /// Widening conversion for the index-by-enum access paths.
    fn to_f64(v: Self) -> f64;

    /// Narrowing conversion with `as`-cast semantics.
    fn from_f64(v: f64) -> Self;
}

macro_rules! impl_element_int {
    ($t:ty, $tag:expr) => {
        impl NrrdElement for $t {
            const TYPE: NrrdType = $tag;

            fn parse_token(token: &str) -> Option<Self> {
                token.parse().ok()
            }

            fn format_token(v: Self) -> String {
                v.to_string()
            }

            fn to_f64(v: Self) -> f64 {
                v as f64
            }

            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    };
}

macro_rules! impl_element_float {
    ($t:ty, $tag:expr) => {
        impl NrrdElement for $t {
            const TYPE: NrrdType = $tag;

            fn parse_token(token: &str) -> Option<Self> {
                // the stdlib parser accepts nan/inf/-inf in any case
                token.parse().ok()
            }

            fn format_token(v: Self) -> String {
                if v.is_nan() {
                    "nan".to_string()
                } else if v.is_infinite() {
                    if v > 0.0 { "inf" } else { "-inf" }.to_string()
                } else {
                    // shortest round-trippable decimal form
                    v.to_string()
                }
            }

            fn to_f64(v: Self) -> f64 {
                v as f64
            }

            fn from_f64(v: f64) -> Self {
                v as $t
            }
        }
    };
}

impl_element_int!(i8, NrrdType::Int8);
impl_element_int!(u8, NrrdType::Uint8);
impl_element_int!(i16, NrrdType::Int16);
impl_element_int!(u16, NrrdType::Uint16);
impl_element_int!(i32, NrrdType::Int32);
impl_element_int!(u32, NrrdType::Uint32);
impl_element_int!(i64, NrrdType::Int64);
impl_element_int!(u64, NrrdType::Uint64);
impl_element_float!(f32, NrrdType::Float);
impl_element_float!(f64, NrrdType::Double);

/// Sample centering along one axis.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Centering {
    /// Centering not known or not applicable.
    Unknown = 0,
    /// Samples sit at the endpoints of the axis intervals.
    Node = 1,
    /// Samples sit at the midpoints of the axis intervals.
    Cell = 2,
}

impl Centering {
    /// Name as written in headers.
    pub fn name(self) -> &'static str {
        match self {
            Centering::Unknown => "none",
            Centering::Node => "node",
            Centering::Cell => "cell",
        }
    }

    /// Recognize a centering token; `none` and `???` both mean unknown.
    pub fn from_name(name: &str) -> Option<Centering> {
        Some(match name.trim().to_ascii_lowercase().as_str() {
            "none" | "???" => Centering::Unknown,
            "node" => Centering::Node,
            "cell" => Centering::Cell,
            _ => return None,
        })
    }
}

impl Default for Centering {
    fn default() -> Centering {
        Centering::Unknown
    }
}

/// Semantic role of one axis.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum AxisKind {
    /// Role not known.
    Unknown = 0,
    /// Any image domain (one of space, time, ...).
    Domain = 1,
    /// Spatial domain axis.
    Space = 2,
    /// Temporal domain axis.
    Time = 3,
    /// Any list of values, non-resampleable.
    List = 4,
    /// Samples are coordinate points.
    Point = 5,
    /// Samples are contravariant vectors.
    Vector = 6,
    /// Samples are covariant vectors (gradients).
    CovariantVector = 7,
    /// Samples are unit-length surface normals.
    Normal = 8,
    /// A size-1 placeholder axis.
    Stub = 9,
    /// A size-1 scalar axis.
    Scalar = 10,
    /// Real and imaginary components.
    Complex = 11,
    /// Any two values.
    TwoVector = 12,
    /// Any three color components.
    ThreeColor = 13,
    /// Red, green, blue.
    RgbColor = 14,
    /// Hue, saturation, value.
    HsvColor = 15,
    /// CIE XYZ.
    XyzColor = 16,
    /// Any four color components.
    FourColor = 17,
    /// Red, green, blue, alpha.
    RgbaColor = 18,
    /// Three-component vector.
    ThreeVector = 19,
    /// Three-component covariant vector.
    ThreeGradient = 20,
    /// Three-component unit vector.
    ThreeNormal = 21,
    /// Four-component vector.
    FourVector = 22,
    /// Quaternion: w x y z.
    Quaternion = 23,
    /// Unique components of a 2-D symmetric matrix: Mxx Mxy Myy.
    TwoDSymMatrix = 24,
    /// Mask plus [`AxisKind::TwoDSymMatrix`].
    TwoDMaskedSymMatrix = 25,
    /// Full 2-D matrix, row-major.
    TwoDMatrix = 26,
    /// Mask plus [`AxisKind::TwoDMatrix`].
    TwoDMaskedMatrix = 27,
    /// Unique components of a 3-D symmetric matrix:
    /// Mxx Mxy Mxz Myy Myz Mzz.
    ThreeDSymMatrix = 28,
    /// Mask plus [`AxisKind::ThreeDSymMatrix`]; seven values per sample.
    ThreeDMaskedSymMatrix = 29,
    /// Full 3-D matrix, row-major.
    ThreeDMatrix = 30,
    /// Mask plus [`AxisKind::ThreeDMatrix`].
    ThreeDMaskedMatrix = 31,
}

impl AxisKind {
    /// Name as written in headers.
    pub fn name(self) -> &'static str {
        use AxisKind::*;
        match self {
            Unknown => "???",
            Domain => "domain",
            Space => "space",
            Time => "time",
            List => "list",
            Point => "point",
            Vector => "vector",
            CovariantVector => "covariant-vector",
            Normal => "normal",
            Stub => "stub",
            Scalar => "scalar",
            Complex => "complex",
            TwoVector => "2-vector",
            ThreeColor => "3-color",
            RgbColor => "RGB-color",
            HsvColor => "HSV-color",
            XyzColor => "XYZ-color",
            FourColor => "4-color",
            RgbaColor => "RGBA-color",
            ThreeVector => "3-vector",
            ThreeGradient => "3-gradient",
            ThreeNormal => "3-normal",
            FourVector => "4-vector",
            Quaternion => "quaternion",
            TwoDSymMatrix => "2D-symmetric-matrix",
            TwoDMaskedSymMatrix => "2D-masked-symmetric-matrix",
            TwoDMatrix => "2D-matrix",
            TwoDMaskedMatrix => "2D-masked-matrix",
            ThreeDSymMatrix => "3D-symmetric-matrix",
            ThreeDMaskedSymMatrix => "3D-masked-symmetric-matrix",
            ThreeDMatrix => "3D-matrix",
            ThreeDMaskedMatrix => "3D-masked-matrix",
        }
    }

    /// Recognize a kind token, case-insensitively.
    pub fn from_name(name: &str) -> Option<AxisKind> {
        use AxisKind::*;
        let lower = name.trim().to_ascii_lowercase();
        Some(match lower.as_str() {
            "???" | "none" => Unknown,
            "domain" => Domain,
            "space" => Space,
            "time" => Time,
            "list" => List,
            "point" => Point,
            "vector" => Vector,
            "covariant-vector" => CovariantVector,
            "normal" => Normal,
            "stub" => Stub,
            "scalar" => Scalar,
            "complex" => Complex,
            "2-vector" => TwoVector,
            "3-color" => ThreeColor,
            "rgb-color" => RgbColor,
            "hsv-color" => HsvColor,
            "xyz-color" => XyzColor,
            "4-color" => FourColor,
            "rgba-color" => RgbaColor,
            "3-vector" => ThreeVector,
            "3-gradient" => ThreeGradient,
            "3-normal" => ThreeNormal,
            "4-vector" => FourVector,
            "quaternion" => Quaternion,
            "2d-symmetric-matrix" => TwoDSymMatrix,
            "2d-masked-symmetric-matrix" => TwoDMaskedSymMatrix,
            "2d-matrix" => TwoDMatrix,
            "2d-masked-matrix" => TwoDMaskedMatrix,
            "3d-symmetric-matrix" => ThreeDSymMatrix,
            "3d-masked-symmetric-matrix" => ThreeDMaskedSymMatrix,
            "3d-matrix" => ThreeDMatrix,
            "3d-masked-matrix" => ThreeDMaskedMatrix,
            _ => return None,
        })
    }
}

impl Default for AxisKind {
    fn default() -> AxisKind {
        AxisKind::Unknown
    }
}

/// World-space tag: names both the dimension and the anatomical (or
/// generic) meaning of the coordinate axes.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Space {
    /// RAS, as in typical neuroimaging.
    RightAnteriorSuperior = 1,
    /// LAS.
    LeftAnteriorSuperior = 2,
    /// LPS, as in DICOM.
    LeftPosteriorSuperior = 3,
    /// RAS plus time.
    RightAnteriorSuperiorTime = 4,
    /// LAS plus time.
    LeftAnteriorSuperiorTime = 5,
    /// LPS plus time.
    LeftPosteriorSuperiorTime = 6,
    /// The scanner's own frame.
    ScannerXyz = 7,
    /// The scanner's own frame plus time.
    ScannerXyzTime = 8,
    /// Generic 3-D right-handed frame.
    ThreeDRightHanded = 9,
    /// Generic 3-D left-handed frame.
    ThreeDLeftHanded = 10,
    /// Generic 3-D right-handed frame plus time.
    ThreeDRightHandedTime = 11,
    /// Generic 3-D left-handed frame plus time.
    ThreeDLeftHandedTime = 12,
}

impl Space {
    /// World-space dimension implied by the tag.
    pub fn dimension(self) -> usize {
        use Space::*;
        match self {
            RightAnteriorSuperior | LeftAnteriorSuperior | LeftPosteriorSuperior | ScannerXyz
            | ThreeDRightHanded | ThreeDLeftHanded => 3,
            RightAnteriorSuperiorTime
            | LeftAnteriorSuperiorTime
            | LeftPosteriorSuperiorTime
            | ScannerXyzTime
            | ThreeDRightHandedTime
            | ThreeDLeftHandedTime => 4,
        }
    }

    /// Name as written in headers.
    pub fn name(self) -> &'static str {
        use Space::*;
        match self {
            RightAnteriorSuperior => "right-anterior-superior",
            LeftAnteriorSuperior => "left-anterior-superior",
            LeftPosteriorSuperior => "left-posterior-superior",
            RightAnteriorSuperiorTime => "right-anterior-superior-time",
            LeftAnteriorSuperiorTime => "left-anterior-superior-time",
            LeftPosteriorSuperiorTime => "left-posterior-superior-time",
            ScannerXyz => "scanner-xyz",
            ScannerXyzTime => "scanner-xyz-time",
            ThreeDRightHanded => "3D-right-handed",
            ThreeDLeftHanded => "3D-left-handed",
            ThreeDRightHandedTime => "3D-right-handed-time",
            ThreeDLeftHandedTime => "3D-left-handed-time",
        }
    }

    /// Recognize a space tag, including the usual abbreviations.
    pub fn from_name(name: &str) -> Option<Space> {
        use Space::*;
        let lower = name.trim().to_ascii_lowercase();
        Some(match lower.as_str() {
            "right-anterior-superior" | "ras" => RightAnteriorSuperior,
            "left-anterior-superior" | "las" => LeftAnteriorSuperior,
            "left-posterior-superior" | "lps" => LeftPosteriorSuperior,
            "right-anterior-superior-time" | "rast" => RightAnteriorSuperiorTime,
            "left-anterior-superior-time" | "last" => LeftAnteriorSuperiorTime,
            "left-posterior-superior-time" | "lpst" => LeftPosteriorSuperiorTime,
            "scanner-xyz" => ScannerXyz,
            "scanner-xyz-time" => ScannerXyzTime,
            "3d-right-handed" => ThreeDRightHanded,
            "3d-left-handed" => ThreeDLeftHanded,
            "3d-right-handed-time" => ThreeDRightHandedTime,
            "3d-left-handed-time" => ThreeDLeftHandedTime,
            _ => return None,
        })
    }
}
