//! IEEE-754 introspection and the "existence" discipline.
//!
//! Throughout this crate a floating-point value "exists" when it is
//! finite; NaN and the infinities stand for missing data (unknown
//! spacing, unset axis bounds, non-spatial direction vectors). The
//! predicate is deliberately written as `!(x - x)` rather than
//! `is_finite()`: NaN − NaN and ∞ − ∞ are both NaN, so the subtraction
//! collapses every non-existent value to a non-zero test. [`sanity`]
//! verifies at run time that the FP environment honors this.

use std::fmt;
use std::hint::black_box;

/// Position of the quiet-NaN bit at the top of the 23-bit float
/// mantissa. 1 on every platform this crate has met; kept as a named
/// constant because [`sanity`] checks it at run time.
pub const QNAN_HI_BIT: u32 = 1;

/// True when `x` is finite. NaN and ±∞ are "missing".
#[inline]
pub fn exists(x: f64) -> bool {
    // black_box keeps the subtraction from being folded away under
    // float optimization
    let d = black_box(x) - black_box(x);
    d == 0.0
}

/// True when `x` is finite. NaN and ±∞ are "missing".
#[inline]
pub fn exists_f32(x: f32) -> bool {
    let d = black_box(x) - black_box(x);
    d == 0.0
}

/// Quiet NaN with the canonical bit pattern.
pub fn nan() -> f64 {
    f64::from_bits(0x7FF8_0000_0000_0000)
}

/// Quiet NaN with the canonical bit pattern, 32-bit.
pub fn nan_f32() -> f32 {
    f32::from_bits(0x7FC0_0000)
}

/// Positive infinity from its bit pattern.
pub fn pos_inf() -> f64 {
    f64::from_bits(0x7FF0_0000_0000_0000)
}

/// Positive infinity from its bit pattern, 32-bit.
pub fn pos_inf_f32() -> f32 {
    f32::from_bits(0x7F80_0000)
}

/// Negative infinity from its bit pattern.
pub fn neg_inf() -> f64 {
    f64::from_bits(0xFFF0_0000_0000_0000)
}

/// Negative infinity from its bit pattern, 32-bit.
pub fn neg_inf_f32() -> f32 {
    f32::from_bits(0xFF80_0000)
}

/// The ten disjoint classes of an IEEE-754 value.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FpClass {
    /// Signalling NaN (quiet bit clear).
    SignallingNan,
    /// Quiet NaN (quiet bit set).
    QuietNan,
    /// Positive infinity.
    PosInf,
    /// Positive normal number.
    PosNorm,
    /// Positive subnormal number.
    PosDenorm,
    /// +0.0
    PosZero,
    /// -0.0
    NegZero,
    /// Negative subnormal number.
    NegDenorm,
    /// Negative normal number.
    NegNorm,
    /// Negative infinity.
    NegInf,
}

/// Classify a 32-bit float by dissecting its bits.
pub fn classify_f32(x: f32) -> FpClass {
    let bits = x.to_bits();
    let neg = bits >> 31 == 1;
    let expo = (bits >> 23) & 0xFF;
    let mant = bits & 0x007F_FFFF;
    match (expo, mant) {
        (0xFF, 0) => {
            if neg {
                FpClass::NegInf
            } else {
                FpClass::PosInf
            }
        }
        (0xFF, m) => {
            if (m >> 22) == QNAN_HI_BIT {
                FpClass::QuietNan
            } else {
                FpClass::SignallingNan
            }
        }
        (0, 0) => {
            if neg {
                FpClass::NegZero
            } else {
                FpClass::PosZero
            }
        }
        (0, _) => {
            if neg {
                FpClass::NegDenorm
            } else {
                FpClass::PosDenorm
            }
        }
        _ => {
            if neg {
                FpClass::NegNorm
            } else {
                FpClass::PosNorm
            }
        }
    }
}

/// Classify a 64-bit float by dissecting its bits.
pub fn classify(x: f64) -> FpClass {
    let bits = x.to_bits();
    let neg = bits >> 63 == 1;
    let expo = (bits >> 52) & 0x7FF;
    let mant = bits & 0x000F_FFFF_FFFF_FFFF;
    match (expo, mant) {
        (0x7FF, 0) => {
            if neg {
                FpClass::NegInf
            } else {
                FpClass::PosInf
            }
        }
        (0x7FF, m) => {
            if ((m >> 51) as u32) == QNAN_HI_BIT {
                FpClass::QuietNan
            } else {
                FpClass::SignallingNan
            }
        }
        (0, 0) => {
            if neg {
                FpClass::NegZero
            } else {
                FpClass::PosZero
            }
        }
        (0, _) => {
            if neg {
                FpClass::NegDenorm
            } else {
                FpClass::PosDenorm
            }
        }
        _ => {
            if neg {
                FpClass::NegNorm
            } else {
                FpClass::PosNorm
            }
        }
    }
}

/// Outcome of the run-time FP environment self-test.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Sanity {
    /// All checks passed.
    Sane,
    /// The byte-order probe disagrees with the compile-time endianness.
    Endian,
    /// `exists(+inf)` was true.
    PInfExists,
    /// `exists(-inf)` was true.
    NInfExists,
    /// `exists(NaN)` was true.
    NanExists,
    /// `exists()` was false for some finite values.
    ExistsBad,
    /// Classification changed across a double-to-float assignment.
    FltDblFpClass,
    /// The quiet-NaN high bit is not where [`QNAN_HI_BIT`] says.
    QnanHiBit,
    /// The canonical NaN constructors did not classify as quiet NaN.
    NanClass,
}

impl fmt::Display for Sanity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let msg = match *self {
            Sanity::Sane => "sanity check passed",
            Sanity::Endian => "byte-order probe is wrong",
            Sanity::PInfExists => "exists(+inf) was true",
            Sanity::NInfExists => "exists(-inf) was true",
            Sanity::NanExists => "exists(NaN) was true",
            Sanity::ExistsBad => "exists() was false for some finite values",
            Sanity::FltDblFpClass => "FP class changed after double->float assignment",
            Sanity::QnanHiBit => "quiet-NaN high bit is wrong",
            Sanity::NanClass => "classify(nan()) is not quiet NaN",
        };
        f.write_str(msg)
    }
}

#[inline(never)]
fn overflow_helper(x: f64) -> f64 {
    black_box(x) * black_box(x)
}

/// Run-time checks that the FP environment behaves the way the rest of
/// the crate assumes. Call once at startup; anything other than
/// [`Sanity::Sane`] means the missing-data conventions are unsound here.
pub fn sanity() -> Sanity {
    // byte-order probe, double-checking the compile-time constant
    let probe: u32 = 1;
    let little = probe.to_ne_bytes()[0] == 1;
    if little != cfg!(target_endian = "little") {
        return Sanity::Endian;
    }

    // generate the infinities at run time, by repeated squaring from
    // values close to the extremes
    let mut pinf = 1e300;
    pinf = overflow_helper(pinf);
    pinf = overflow_helper(pinf);
    if exists(pinf) {
        return Sanity::PInfExists;
    }
    let ninf = -pinf;
    if exists(ninf) {
        return Sanity::NInfExists;
    }
    let nan_rt = black_box(pinf) / black_box(pinf);
    if exists(nan_rt) {
        return Sanity::NanExists;
    }
    if !(exists(0.0)
        && exists(-0.0)
        && exists(1.0)
        && exists(-1.0)
        && exists(42.42)
        && exists(std::f64::consts::PI))
    {
        return Sanity::ExistsBad;
    }

    // quiet-NaN high bit of the run-time NaN, seen as a float
    let nan_f = nan_rt as f32;
    if (nan_f.to_bits() & 0x007F_FFFF) >> 22 != QNAN_HI_BIT {
        return Sanity::QnanHiBit;
    }

    // the bit-pattern constructors must classify as quiet NaN at both
    // widths
    if classify(nan()) != FpClass::QuietNan || classify_f32(nan_f32()) != FpClass::QuietNan {
        return Sanity::NanClass;
    }

    // double-to-float assignment must preserve the class of
    // non-existent values
    if classify_f32(nan_rt as f32) != FpClass::QuietNan
        || classify_f32(pinf as f32) != FpClass::PosInf
        || classify_f32(ninf as f32) != FpClass::NegInf
    {
        return Sanity::FltDblFpClass;
    }

    Sanity::Sane
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exists_predicate() {
        assert!(exists(0.0));
        assert!(exists(-0.0));
        assert!(exists(std::f64::consts::PI));
        assert!(exists(-1e308));
        assert!(!exists(nan()));
        assert!(!exists(pos_inf()));
        assert!(!exists(neg_inf()));
        assert!(exists_f32(1.5));
        assert!(!exists_f32(nan_f32()));
        assert!(!exists_f32(pos_inf_f32()));
        assert!(!exists_f32(neg_inf_f32()));
    }

    #[test]
    fn constructors_round_trip_bits() {
        assert_eq!(nan().to_bits(), 0x7FF8_0000_0000_0000);
        assert_eq!(pos_inf(), f64::INFINITY);
        assert_eq!(neg_inf(), f64::NEG_INFINITY);
        assert_eq!(pos_inf_f32(), f32::INFINITY);
        assert_eq!(neg_inf_f32(), f32::NEG_INFINITY);
    }

    #[test]
    fn classification() {
        assert_eq!(classify(1.0), FpClass::PosNorm);
        assert_eq!(classify(-1.0), FpClass::NegNorm);
        assert_eq!(classify(0.0), FpClass::PosZero);
        assert_eq!(classify(-0.0), FpClass::NegZero);
        assert_eq!(classify(5e-324), FpClass::PosDenorm);
        assert_eq!(classify(-5e-324), FpClass::NegDenorm);
        assert_eq!(classify(pos_inf()), FpClass::PosInf);
        assert_eq!(classify(neg_inf()), FpClass::NegInf);
        assert_eq!(classify(nan()), FpClass::QuietNan);
        assert_eq!(classify_f32(1.0), FpClass::PosNorm);
        assert_eq!(classify_f32(nan_f32()), FpClass::QuietNan);
        assert_eq!(classify_f32(f32::from_bits(1)), FpClass::PosDenorm);
    }

    #[test]
    fn sanity_passes_here() {
        assert_eq!(sanity(), Sanity::Sane);
    }
}
