//! Type-erased sample storage.
//!
//! Every concrete sample type stores its samples in a `Vec<T>`. Buffers hold
//! the vector behind [`SampleStorage`] so that generic engine code (resizing,
//! resetting, copying between buffers of the same type, formatting) works
//! without knowing `T`, and nodes get typed slices back through a downcast.

use std::any::Any;
use std::collections::TryReserveError;

use super::Sample;

/// Operations on a homogeneous, growable array of samples.
pub trait SampleStorage: Any + Send {
    /// Number of initialized samples.
    fn len(&self) -> usize;

    /// Returns `true` if no samples are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of samples that fit without reallocating.
    fn capacity(&self) -> usize;

    /// Grows or shrinks the allocation to hold at least `capacity` samples.
    ///
    /// Shrinking below [`len`](Self::len) drops the trailing samples.
    fn set_capacity(&mut self, capacity: usize) -> Result<(), TryReserveError>;

    /// Drops samples beyond `len`, keeping the allocation.
    fn truncate(&mut self, len: usize);

    /// Appends copies of `src[offset..offset + count]`.
    ///
    /// Returns `Ok(false)` if `src` stores a different Rust type. On a copy
    /// failure the storage is rolled back to its previous length.
    fn extend_from(
        &mut self,
        src: &dyn SampleStorage,
        offset: usize,
        count: usize,
    ) -> Result<bool, String>;

    /// Renders sample `index` as text.
    fn format_sample(&self, index: usize) -> Option<String>;

    /// Parses `text` and appends the result. Returns `false` if it does not parse.
    fn push_parsed(&mut self, text: &str) -> bool;

    /// Upcast for typed access.
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed access.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Sample> SampleStorage for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }

    fn set_capacity(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        if capacity < Vec::len(self) {
            Vec::truncate(self, capacity);
        }
        if capacity > Vec::capacity(self) {
            self.try_reserve_exact(capacity - Vec::len(self))
        } else {
            self.shrink_to(capacity);
            Ok(())
        }
    }

    fn truncate(&mut self, len: usize) {
        Vec::truncate(self, len);
    }

    fn extend_from(
        &mut self,
        src: &dyn SampleStorage,
        offset: usize,
        count: usize,
    ) -> Result<bool, String> {
        let Some(src) = src.as_any().downcast_ref::<Vec<T>>() else {
            return Ok(false);
        };
        let old_len = Vec::len(self);
        for sample in &src[offset..offset + count] {
            match sample.copy_sample() {
                Ok(copy) => self.push(copy),
                Err(reason) => {
                    Vec::truncate(self, old_len);
                    return Err(reason);
                }
            }
        }
        Ok(true)
    }

    fn format_sample(&self, index: usize) -> Option<String> {
        self.get(index).and_then(Sample::to_text)
    }

    fn push_parsed(&mut self, text: &str) -> bool {
        match T::from_text(text) {
            Some(sample) => {
                self.push(sample);
                true
            }
            None => false,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Storage of a buffer whose type is still the wildcard. It never holds samples.
#[derive(Debug, Default)]
pub struct Unbound;

impl SampleStorage for Unbound {
    fn len(&self) -> usize {
        0
    }

    fn capacity(&self) -> usize {
        0
    }

    fn set_capacity(&mut self, _capacity: usize) -> Result<(), TryReserveError> {
        Ok(())
    }

    fn truncate(&mut self, _len: usize) {}

    fn extend_from(
        &mut self,
        _src: &dyn SampleStorage,
        _offset: usize,
        _count: usize,
    ) -> Result<bool, String> {
        Ok(false)
    }

    fn format_sample(&self, _index: usize) -> Option<String> {
        None
    }

    fn push_parsed(&mut self, _text: &str) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_capacity_grows_without_touching_len() {
        let mut v: Vec<u32> = vec![1, 2];
        SampleStorage::set_capacity(&mut v, 64).unwrap();
        assert!(SampleStorage::capacity(&v) >= 64);
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn test_set_capacity_below_len_truncates() {
        let mut v: Vec<u32> = vec![1, 2, 3, 4];
        SampleStorage::set_capacity(&mut v, 2).unwrap();
        assert_eq!(v, vec![1, 2]);
    }

    #[test]
    fn test_extend_from_rejects_other_type() {
        let mut dst: Vec<u32> = Vec::new();
        let src: Vec<u64> = vec![1, 2];
        assert_eq!(dst.extend_from(&src, 0, 2), Ok(false));
        assert!(dst.is_empty());
    }

    #[test]
    fn test_extend_from_copies_range() {
        let mut dst: Vec<String> = vec!["a".to_string()];
        let src: Vec<String> = vec!["x".into(), "y".into(), "z".into()];
        assert_eq!(dst.extend_from(&src, 1, 2), Ok(true));
        assert_eq!(dst, vec!["a", "y", "z"]);
    }

    #[test]
    fn test_capacity_overflow_is_reported() {
        let mut v: Vec<u64> = Vec::new();
        assert!(SampleStorage::set_capacity(&mut v, usize::MAX).is_err());
    }
}
