//! The array object: a typed N-dimensional raster with per-axis
//! metadata, world-space orientation, key/value attachments and
//! comments.

use crate::axis::{Axis, DIM_MAX, SPACE_DIM_MAX};
use crate::error::{NrrdError, Result};
use crate::format::field::is_reserved_key;
use crate::fp;
use crate::typedef::{NrrdElement, NrrdType, Space};

/// Selection bits for [`Nrrd::basic_info_copy`].
pub mod basic_info {
    /// Provenance string.
    pub const CONTENT: u32 = 1 << 0;
    /// Units of the sample values.
    pub const SAMPLE_UNITS: u32 = 1 << 1;
    /// Space tag, dimension, units and origin.
    pub const SPACE: u32 = 1 << 2;
    /// Measurement frame matrix.
    pub const MEASUREMENT_FRAME: u32 = 1 << 3;
    /// Pre-quantisation range.
    pub const OLD_MIN_MAX: u32 = 1 << 4;
    /// Comment lines.
    pub const COMMENTS: u32 = 1 << 5;
    /// Key/value pairs.
    pub const KEY_VALUE_PAIRS: u32 = 1 << 6;
    /// Every non-per-axis field.
    pub const ALL: u32 = CONTENT
        | SAMPLE_UNITS
        | SPACE
        | MEASUREMENT_FRAME
        | OLD_MIN_MAX
        | COMMENTS
        | KEY_VALUE_PAIRS;
}

/// An N-dimensional regularly sampled array.
///
/// `data` holds the elements contiguously, row-major with the *first*
/// axis varying fastest. All fields besides the key/value store are
/// public and named after the file format's header fields; float fields
/// use NaN for "missing".
#[derive(Debug, Clone, PartialEq)]
pub struct Nrrd {
    /// The element bytes.
    pub data: Vec<u8>,
    /// Element type.
    pub ty: NrrdType,
    /// Bytes per element when `ty` is [`NrrdType::Block`]; 0 otherwise.
    pub block_size: usize,
    /// Per-axis metadata; the length is the array rank.
    pub axes: Vec<Axis>,
    /// Free-form provenance description of the data.
    pub content: Option<String>,
    /// Units of the sample values themselves.
    pub sample_units: Option<String>,
    /// Lower end of the value range prior to quantisation.
    pub old_min: f64,
    /// Upper end of the value range prior to quantisation.
    pub old_max: f64,
    /// World-space tag; implies `space_dim` when set.
    pub space: Option<Space>,
    /// World-space dimension; 0 when no orientation is recorded.
    pub space_dim: usize,
    /// Units of each world-space axis, `space_dim` entries.
    pub space_units: Vec<Option<String>>,
    /// World position of the sample at index (0,...,0).
    pub space_origin: [f64; SPACE_DIM_MAX],
    /// Rotation taking per-sample vector/tensor coefficients into world
    /// space; `measurement_frame[i]` is the world-space vector for the
    /// i-th coefficient frame axis.
    pub measurement_frame: [[f64; SPACE_DIM_MAX]; SPACE_DIM_MAX],
    /// Comment lines, without any leading `#`.
    pub comments: Vec<String>,
    kvp: Vec<(String, String)>,
}

impl Default for Nrrd {
    fn default() -> Nrrd {
        Nrrd {
            data: Vec::new(),
            ty: NrrdType::Unknown,
            block_size: 0,
            axes: Vec::new(),
            content: None,
            sample_units: None,
            old_min: fp::nan(),
            old_max: fp::nan(),
            space: None,
            space_dim: 0,
            space_units: Vec::new(),
            space_origin: [fp::nan(); SPACE_DIM_MAX],
            measurement_frame: [[fp::nan(); SPACE_DIM_MAX]; SPACE_DIM_MAX],
            comments: Vec::new(),
            kvp: Vec::new(),
        }
    }
}

impl Nrrd {
    /// Empty array: rank 0, unknown type, no data.
    pub fn new() -> Nrrd {
        Nrrd::default()
    }

    /// Allocate a zero-filled array of the given type and axis sizes.
    pub fn alloc(ty: NrrdType, sizes: &[usize]) -> Result<Nrrd> {
        let mut nrrd = Nrrd::new();
        nrrd.ty = ty;
        nrrd.axes = sizes.iter().map(|&s| Axis::sized(s)).collect();
        let nbytes = nrrd
            .checked_byte_count()
            .ok_or_else(|| NrrdError::validation("alloc: byte count overflows".to_string()))?;
        if nbytes == 0 {
            return Err(NrrdError::validation(format!(
                "alloc: {} array sized {:?} has no bytes",
                ty, sizes
            )));
        }
        nrrd.data = vec![0u8; nbytes];
        Ok(nrrd)
    }

    /// Allocate a zero-filled block-type array; `block_size` is the
    /// byte size of one element.
    pub fn alloc_block(block_size: usize, sizes: &[usize]) -> Result<Nrrd> {
        let mut nrrd = Nrrd::new();
        nrrd.ty = NrrdType::Block;
        nrrd.block_size = block_size;
        nrrd.axes = sizes.iter().map(|&s| Axis::sized(s)).collect();
        let nbytes = nrrd.checked_byte_count().ok_or_else(|| {
            NrrdError::validation("alloc_block: byte count overflows".to_string())
        })?;
        if nbytes == 0 {
            return Err(NrrdError::validation(
                "alloc_block: zero block size or axis size".to_string(),
            ));
        }
        nrrd.data = vec![0u8; nbytes];
        Ok(nrrd)
    }

    /// Adopt a caller-provided byte buffer without copying. The buffer
    /// length must match the product of `sizes` and the element size;
    /// take it back with [`Nrrd::into_raw_data`].
    pub fn wrap(data: Vec<u8>, ty: NrrdType, sizes: &[usize]) -> Result<Nrrd> {
        let mut nrrd = Nrrd::new();
        nrrd.ty = ty;
        nrrd.axes = sizes.iter().map(|&s| Axis::sized(s)).collect();
        let want = nrrd.checked_byte_count().ok_or_else(|| {
            NrrdError::validation(format!("wrap: sizes {:?} overflow the byte count", sizes))
        })?;
        if data.len() != want {
            return Err(NrrdError::validation(format!(
                "wrap: got {} bytes but {} sized {:?} needs {}",
                data.len(),
                ty,
                sizes,
                want
            )));
        }
        nrrd.data = data;
        Ok(nrrd)
    }

    /// Build an array from a typed value buffer, choosing the element
    /// type from `T`.
    pub fn from_vec<T: NrrdElement>(values: Vec<T>, sizes: &[usize]) -> Result<Nrrd> {
        let n = sizes
            .iter()
            .try_fold(1usize, |n, &s| n.checked_mul(s))
            .ok_or_else(|| {
                NrrdError::validation(format!("from_vec: sizes {:?} overflow", sizes))
            })?;
        if n != values.len() {
            return Err(NrrdError::validation(format!(
                "from_vec: got {} values but sizes {:?} need {}",
                values.len(),
                sizes,
                n
            )));
        }
        let bytes = bytemuck::cast_slice::<T, u8>(&values).to_vec();
        Nrrd::wrap(bytes, T::TYPE, sizes)
    }

    /// Array rank.
    pub fn dim(&self) -> usize {
        self.axes.len()
    }

    /// Axis sizes, fastest first.
    pub fn sizes(&self) -> Vec<usize> {
        self.axes.iter().map(|a| a.size).collect()
    }

    /// Size of one element in bytes.
    pub fn element_size(&self) -> usize {
        if self.ty == NrrdType::Block {
            self.block_size
        } else {
            self.ty.size_of()
        }
    }

    /// Number of elements (product of the axis sizes). Saturates at
    /// `usize::MAX` when the product overflows; [`Nrrd::check`] rejects
    /// such shapes.
    pub fn element_count(&self) -> usize {
        if self.axes.is_empty() {
            0
        } else {
            self.axes
                .iter()
                .try_fold(1usize, |n, a| n.checked_mul(a.size))
                .unwrap_or(usize::MAX)
        }
    }

    /// Total payload bytes, or `None` when the sizes overflow `usize`.
    pub(crate) fn checked_byte_count(&self) -> Option<usize> {
        if self.axes.is_empty() {
            return Some(0);
        }
        self.axes
            .iter()
            .try_fold(1usize, |n, a| n.checked_mul(a.size))
            .and_then(|n| n.checked_mul(self.element_size()))
    }

    /// Give the data buffer back to the caller, dropping the header.
    pub fn into_raw_data(self) -> Vec<u8> {
        self.data
    }

    /// Borrow the elements as a typed slice. Fails when `T` does not
    /// match the run-time type, or when the buffer happens to be
    /// misaligned for `T` (use [`Nrrd::values`] for a copy that always
    /// works).
    pub fn as_slice<T: NrrdElement>(&self) -> Result<&[T]> {
        if self.ty != T::TYPE {
            return Err(NrrdError::validation(format!(
                "as_slice: array holds {}, not {}",
                self.ty,
                T::TYPE
            )));
        }
        bytemuck::try_cast_slice(&self.data).map_err(|e| {
            NrrdError::validation(format!("as_slice: cannot view data as {}: {}", T::TYPE, e))
        })
    }

    /// Borrow the elements as a mutable typed slice.
    pub fn as_slice_mut<T: NrrdElement>(&mut self) -> Result<&mut [T]> {
        if self.ty != T::TYPE {
            return Err(NrrdError::validation(format!(
                "as_slice_mut: array holds {}, not {}",
                self.ty,
                T::TYPE
            )));
        }
        bytemuck::try_cast_slice_mut(&mut self.data).map_err(|e| {
            NrrdError::validation(format!(
                "as_slice_mut: cannot view data as {}: {}",
                T::TYPE,
                e
            ))
        })
    }

    /// Copy the elements out as a typed vector; alignment-independent.
    pub fn values<T: NrrdElement>(&self) -> Result<Vec<T>> {
        if self.ty != T::TYPE {
            return Err(NrrdError::validation(format!(
                "values: array holds {}, not {}",
                self.ty,
                T::TYPE
            )));
        }
        let s = self.element_size();
        Ok(self
            .data
            .chunks_exact(s)
            .map(bytemuck::pod_read_unaligned)
            .collect())
    }

    /// Validate every structural invariant; the error names the first
    /// violation found.
    pub fn check(&self) -> Result<()> {
        let me = "check";
        if self.dim() == 0 {
            return Err(NrrdError::validation(format!("{}: dimension is 0", me)));
        }
        if self.dim() > DIM_MAX {
            return Err(NrrdError::validation(format!(
                "{}: dimension {} exceeds {}",
                me,
                self.dim(),
                DIM_MAX
            )));
        }
        if self.ty == NrrdType::Unknown {
            return Err(NrrdError::validation(format!("{}: type is unknown", me)));
        }
        if self.ty == NrrdType::Block && self.block_size == 0 {
            return Err(NrrdError::validation(format!(
                "{}: block type with block size 0",
                me
            )));
        }
        for (i, ax) in self.axes.iter().enumerate() {
            if ax.size == 0 {
                return Err(NrrdError::validation(format!(
                    "{}: axis {} has size 0",
                    me, i
                )));
            }
        }
        let want = self.checked_byte_count().ok_or_else(|| {
            NrrdError::validation(format!(
                "{}: axis sizes overflow the addressable byte count",
                me
            ))
        })?;
        if self.data.len() != want {
            return Err(NrrdError::validation(format!(
                "{}: data is {} bytes but sizes and type need {}",
                me,
                self.data.len(),
                want
            )));
        }
        self.check_space(me)
    }

    fn check_space(&self, me: &str) -> Result<()> {
        if self.space_dim == 0 {
            return Ok(());
        }
        if self.space_dim > SPACE_DIM_MAX {
            return Err(NrrdError::validation(format!(
                "{}: space dimension {} exceeds {}",
                me, self.space_dim, SPACE_DIM_MAX
            )));
        }
        if let Some(space) = self.space {
            if space.dimension() != self.space_dim {
                return Err(NrrdError::validation(format!(
                    "{}: space {} implies dimension {}, not {}",
                    me,
                    space.name(),
                    space.dimension(),
                    self.space_dim
                )));
            }
        }
        if !self.space_units.is_empty() && self.space_units.len() != self.space_dim {
            return Err(NrrdError::validation(format!(
                "{}: {} space units for space dimension {}",
                me,
                self.space_units.len(),
                self.space_dim
            )));
        }
        // origin and each direction row are all-set or all-missing
        let origin_set = self.space_origin[..self.space_dim]
            .iter()
            .filter(|&&c| fp::exists(c))
            .count();
        if origin_set != 0 && origin_set != self.space_dim {
            return Err(NrrdError::validation(format!(
                "{}: space origin is only partially set",
                me
            )));
        }
        for (i, ax) in self.axes.iter().enumerate() {
            let set = ax.space_direction[..self.space_dim]
                .iter()
                .filter(|&&c| fp::exists(c))
                .count();
            if set != 0 && set != self.space_dim {
                return Err(NrrdError::validation(format!(
                    "{}: space direction of axis {} is only partially set",
                    me, i
                )));
            }
        }
        for j in 0..self.space_dim {
            let set = self.measurement_frame[j][..self.space_dim]
                .iter()
                .filter(|&&c| fp::exists(c))
                .count();
            if set != 0 && set != self.space_dim {
                return Err(NrrdError::validation(format!(
                    "{}: measurement frame vector {} is only partially set",
                    me, j
                )));
            }
        }
        Ok(())
    }

    /// Copy per-axis fields from `src`, selected by `bits` (see
    /// [`crate::axis::info`]). `ax_map`, when given, names the source
    /// axis feeding each destination axis; identity otherwise (which
    /// requires equal rank).
    pub fn axis_info_copy(
        &mut self,
        src: &Nrrd,
        ax_map: Option<&[usize]>,
        bits: u32,
    ) -> Result<()> {
        let me = "axis_info_copy";
        if let Some(map) = ax_map {
            if map.len() != self.dim() {
                return Err(NrrdError::validation(format!(
                    "{}: map has {} entries for a {}-D array",
                    me,
                    map.len(),
                    self.dim()
                )));
            }
            for (i, &srci) in map.iter().enumerate() {
                if srci >= src.dim() {
                    return Err(NrrdError::validation(format!(
                        "{}: map[{}] = {} is out of range for a {}-D source",
                        me,
                        i,
                        srci,
                        src.dim()
                    )));
                }
                let from = src.axes[srci].clone();
                self.axes[i].copy_info(&from, bits);
            }
        } else {
            if src.dim() != self.dim() {
                return Err(NrrdError::validation(format!(
                    "{}: ranks differ ({} vs {}) and no map given",
                    me,
                    self.dim(),
                    src.dim()
                )));
            }
            for (dst, from) in self.axes.iter_mut().zip(&src.axes) {
                dst.copy_info(from, bits);
            }
        }
        Ok(())
    }

    /// Copy non-per-axis fields from `src`, selected by `bits` (see
    /// [`basic_info`]).
    pub fn basic_info_copy(&mut self, src: &Nrrd, bits: u32) {
        if bits & basic_info::CONTENT != 0 {
            self.content = src.content.clone();
        }
        if bits & basic_info::SAMPLE_UNITS != 0 {
            self.sample_units = src.sample_units.clone();
        }
        if bits & basic_info::SPACE != 0 {
            self.space = src.space;
            self.space_dim = src.space_dim;
            self.space_units = src.space_units.clone();
            self.space_origin = src.space_origin;
        }
        if bits & basic_info::MEASUREMENT_FRAME != 0 {
            self.measurement_frame = src.measurement_frame;
        }
        if bits & basic_info::OLD_MIN_MAX != 0 {
            self.old_min = src.old_min;
            self.old_max = src.old_max;
        }
        if bits & basic_info::COMMENTS != 0 {
            self.comments = src.comments.clone();
        }
        if bits & basic_info::KEY_VALUE_PAIRS != 0 {
            self.kvp = src.kvp.clone();
        }
    }

    /// Append a comment line; leading `#`s and surrounding space are
    /// stripped.
    pub fn comment_add(&mut self, comment: &str) {
        let stripped = comment.trim_start_matches('#').trim();
        self.comments.push(stripped.to_string());
    }

    /// Append all of `src`'s comments.
    pub fn comment_copy(&mut self, src: &Nrrd) {
        self.comments.extend(src.comments.iter().cloned());
    }

    /// Drop all comments.
    pub fn comment_clear(&mut self) {
        self.comments.clear();
    }

    /// Attach a key/value pair. The key must be unique and must not
    /// collide with a header field name; an existing value under the
    /// same key is replaced.
    pub fn kvp_add(&mut self, key: &str, value: &str) -> Result<()> {
        if key.is_empty() {
            return Err(NrrdError::validation("kvp_add: empty key".to_string()));
        }
        if is_reserved_key(key) {
            return Err(NrrdError::validation(format!(
                "kvp_add: key \"{}\" is a header field name",
                key
            )));
        }
        match self.kvp.iter_mut().find(|(k, _)| k == key) {
            Some(pair) => pair.1 = value.to_string(),
            None => self.kvp.push((key.to_string(), value.to_string())),
        }
        Ok(())
    }

    /// Value stored under `key`, if any.
    pub fn kvp_get(&self, key: &str) -> Option<&str> {
        self.kvp
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Number of key/value pairs.
    pub fn kvp_len(&self) -> usize {
        self.kvp.len()
    }

    /// The key/value pairs in insertion order.
    pub fn kvps(&self) -> impl Iterator<Item = (&str, &str)> {
        self.kvp.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove the pair under `key`; true when something was removed.
    pub fn kvp_remove(&mut self, key: &str) -> bool {
        let before = self.kvp.len();
        self.kvp.retain(|(k, _)| k != key);
        self.kvp.len() != before
    }

    /// Drop all key/value pairs.
    pub fn kvp_clear(&mut self) {
        self.kvp.clear();
    }

    /// Whether any world-space orientation is recorded.
    pub fn has_space(&self) -> bool {
        self.space_dim > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alloc_and_wrap() {
        let n = Nrrd::alloc(NrrdType::Uint16, &[3, 2]).unwrap();
        assert_eq!(n.data.len(), 12);
        assert_eq!(n.dim(), 2);
        n.check().unwrap();

        let w = Nrrd::wrap(vec![0u8; 12], NrrdType::Uint16, &[3, 2]).unwrap();
        w.check().unwrap();
        assert!(Nrrd::wrap(vec![0u8; 11], NrrdType::Uint16, &[3, 2]).is_err());
        assert_eq!(w.into_raw_data().len(), 12);
    }

    #[test]
    fn from_vec_and_values() {
        let n = Nrrd::from_vec(vec![1.0f32, 2.5, -1.0, 4.0], &[2, 2]).unwrap();
        assert_eq!(n.ty, NrrdType::Float);
        assert_eq!(n.values::<f32>().unwrap(), vec![1.0, 2.5, -1.0, 4.0]);
        assert!(n.values::<f64>().is_err());
        assert_eq!(n.ty.lookup_f64(&n.data, 1), 2.5);
    }

    #[test]
    fn check_catches_violations() {
        let mut n = Nrrd::from_vec(vec![0u8; 6], &[3, 2]).unwrap();
        n.check().unwrap();

        n.data.pop();
        assert!(n.check().is_err());
        n.data.push(0);

        n.axes.clear();
        assert!(n.check().is_err());

        let mut b = Nrrd::alloc_block(4, &[2]).unwrap();
        b.check().unwrap();
        b.block_size = 0;
        assert!(b.check().is_err());

        let mut u = Nrrd::new();
        u.axes.push(Axis::sized(1));
        u.data = vec![0];
        assert!(u.check().is_err()); // unknown type
    }

    #[test]
    fn huge_sizes_do_not_panic() {
        let mut n = Nrrd::new();
        n.ty = NrrdType::Uint8;
        n.axes = [5_000_000_000usize; 3].iter().map(|&s| Axis::sized(s)).collect();
        assert_eq!(n.element_count(), usize::MAX);
        let msg = format!("{}", n.check().unwrap_err());
        assert!(msg.contains("overflow"), "got: {}", msg);

        assert!(Nrrd::alloc(NrrdType::Uint16, &[usize::MAX, 2]).is_err());
        assert!(Nrrd::wrap(vec![0u8; 4], NrrdType::Uint16, &[usize::MAX, 2]).is_err());
        assert!(Nrrd::from_vec(vec![0u8; 4], &[usize::MAX, 2]).is_err());
    }

    #[test]
    fn check_space_consistency() {
        let mut n = Nrrd::from_vec(vec![0.0f64; 8], &[2, 2, 2]).unwrap();
        n.space_dim = 3;
        for (i, ax) in n.axes.iter_mut().enumerate() {
            ax.space_direction[..3].copy_from_slice(&[0.0, 0.0, 0.0]);
            ax.space_direction[i] = 1.0;
        }
        n.check().unwrap();

        n.axes[1].space_direction[2] = fp::nan();
        assert!(n.check().is_err());
    }

    #[test]
    fn kvp_semantics() {
        let mut n = Nrrd::new();
        n.kvp_add("who", "me").unwrap();
        n.kvp_add("what", "data").unwrap();
        n.kvp_add("who", "you").unwrap(); // replaces
        assert_eq!(n.kvp_len(), 2);
        assert_eq!(n.kvp_get("who"), Some("you"));
        let keys: Vec<_> = n.kvps().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["who", "what"]); // insertion order
        assert!(n.kvp_add("sizes", "nope").is_err());
        assert!(n.kvp_remove("who"));
        assert_eq!(n.kvp_len(), 1);
    }

    #[test]
    fn comments_strip_hash() {
        let mut n = Nrrd::new();
        n.comment_add("## hello there ");
        n.comment_add("plain");
        assert_eq!(n.comments, vec!["hello there", "plain"]);
    }
}
