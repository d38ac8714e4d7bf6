//! Typed sample buffers shared between one output port and its readers.
//!
//! A [`Buffer`] is created for every output port when its node is
//! instantiated. Each connected input port takes a reference; the buffer is
//! destroyed (dropping every live sample exactly once) when the last reference
//! goes. Buffers are logically emptied at the start of every schedule pass but
//! keep their allocation.

use std::any::type_name;
use std::fmt;

use crate::error::DfgError;
use crate::types::{DataType, Sample, SampleStorage, TypeRef};

/// Handle of a buffer inside a graph's buffer arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub(crate) u32);

impl BufferId {
    /// Returns the arena slot of this buffer.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BufferId({})", self.0)
    }
}

/// Growable, homogeneously typed array of samples.
///
/// Typed accessors (`write`, `read`, `get`, ...) check that the requested Rust
/// type matches the buffer's sample type and fail with
/// [`DfgError::BufferType`] otherwise. Type-erased operations (`resize`,
/// `copy_from`, `format_sample`) work on any buffer.
pub struct Buffer {
    data_type: TypeRef,
    storage: Box<dyn SampleStorage>,
    refs: usize,
}

impl Buffer {
    /// Creates an empty buffer with a single reference (its producer).
    pub fn new(data_type: TypeRef) -> Self {
        let storage = data_type.new_storage();
        Self {
            data_type,
            storage,
            refs: 1,
        }
    }

    /// Current sample type.
    pub fn data_type(&self) -> &TypeRef {
        &self.data_type
    }

    /// Number of stored samples.
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns `true` if no samples are stored.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Number of samples the current allocation can hold.
    pub fn capacity(&self) -> usize {
        self.storage.capacity()
    }

    /// Total number of references, producer included.
    pub fn ref_count(&self) -> usize {
        self.refs
    }

    /// Number of connected readers (references beyond the producer).
    pub fn readers(&self) -> usize {
        self.refs.saturating_sub(1)
    }

    /// Takes an additional reference.
    pub fn inc_ref(&mut self) {
        self.refs += 1;
    }

    /// Drops a reference. Returns `true` if it was the last one, in which case
    /// the owner must destroy the buffer.
    pub fn dec_ref(&mut self) -> bool {
        self.refs = self.refs.saturating_sub(1);
        self.refs == 0
    }

    /// Grows or shrinks the allocation to `capacity` samples.
    ///
    /// Growing never touches stored samples. Shrinking below
    /// [`len`](Self::len) drops the trailing samples.
    pub fn resize(&mut self, capacity: usize) -> Result<(), DfgError> {
        self.storage
            .set_capacity(capacity)
            .map_err(|_| self.allocation_error(capacity))
    }

    /// Appends copies of `samples`.
    ///
    /// If a copy fails partway, the samples appended so far are dropped and
    /// the length is restored; the allocation is kept.
    pub fn write<T: Sample>(&mut self, samples: &[T]) -> Result<(), DfgError> {
        let Self {
            data_type, storage, ..
        } = self;
        let vec = downcast_mut::<T>(storage.as_mut(), data_type)?;
        vec.try_reserve(samples.len())
            .map_err(|_| DfgError::Allocation {
                type_name: data_type.name().to_string(),
                requested: samples.len(),
            })?;

        let old_len = vec.len();
        for sample in samples {
            match sample.copy_sample() {
                Ok(copy) => vec.push(copy),
                Err(reason) => {
                    vec.truncate(old_len);
                    return Err(DfgError::SampleCopy {
                        type_name: data_type.name().to_string(),
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Appends one sample, taking ownership of it.
    pub fn push<T: Sample>(&mut self, sample: T) -> Result<(), DfgError> {
        let Self {
            data_type, storage, ..
        } = self;
        let vec = downcast_mut::<T>(storage.as_mut(), data_type)?;
        vec.try_reserve(1).map_err(|_| DfgError::Allocation {
            type_name: data_type.name().to_string(),
            requested: 1,
        })?;
        vec.push(sample);
        Ok(())
    }

    /// Appends `count` default-initialized samples and returns them for the
    /// caller to fill in place.
    pub fn reserve<T: Sample>(&mut self, count: usize) -> Result<&mut [T], DfgError> {
        let Self {
            data_type, storage, ..
        } = self;
        let vec = downcast_mut::<T>(storage.as_mut(), data_type)?;
        vec.try_reserve(count).map_err(|_| DfgError::Allocation {
            type_name: data_type.name().to_string(),
            requested: count,
        })?;
        let old_len = vec.len();
        vec.resize_with(old_len + count, T::default);
        Ok(&mut vec[old_len..])
    }

    /// Removes the last `count` samples without reallocating.
    pub fn shrink(&mut self, count: usize) -> Result<(), DfgError> {
        let len = self.len();
        if count > len {
            return Err(DfgError::OutOfRange {
                offset: 0,
                count,
                len,
            });
        }
        self.storage.truncate(len - count);
        Ok(())
    }

    /// Drops every sample, keeping the allocation.
    pub fn reset(&mut self) {
        self.storage.truncate(0);
    }

    /// All stored samples.
    pub fn samples<T: Sample>(&self) -> Result<&[T], DfgError> {
        downcast_ref::<T>(self.storage.as_ref(), &self.data_type).map(Vec::as_slice)
    }

    /// The first `count` samples.
    pub fn read<T: Sample>(&self, count: usize) -> Result<&[T], DfgError> {
        self.get(0, count)
    }

    /// Samples `offset..offset + count`.
    pub fn get<T: Sample>(&self, offset: usize, count: usize) -> Result<&[T], DfgError> {
        let samples = self.samples::<T>()?;
        let end = offset.checked_add(count).filter(|&end| end <= samples.len());
        match end {
            Some(end) => Ok(&samples[offset..end]),
            None => Err(DfgError::OutOfRange {
                offset,
                count,
                len: samples.len(),
            }),
        }
    }

    /// The sample at `index`.
    pub fn sample<T: Sample>(&self, index: usize) -> Result<&T, DfgError> {
        self.get::<T>(index, 1).map(|s| &s[0])
    }

    /// The most recently written sample.
    pub fn read_last<T: Sample>(&self) -> Result<&T, DfgError> {
        let samples = self.samples::<T>()?;
        samples.last().ok_or(DfgError::OutOfRange {
            offset: 0,
            count: 1,
            len: 0,
        })
    }

    /// Appends copies of `src[offset..offset + count]` from a buffer of the
    /// same sample type, whatever that type is.
    pub fn copy_from(&mut self, src: &Buffer, offset: usize, count: usize) -> Result<(), DfgError> {
        if offset.checked_add(count).is_none_or(|end| end > src.len()) {
            return Err(DfgError::OutOfRange {
                offset,
                count,
                len: src.len(),
            });
        }
        if self.data_type.is_any() || *self.data_type != *src.data_type {
            return Err(DfgError::BufferType {
                buffer_type: self.data_type.name().to_string(),
                requested: src.data_type.rust_type().unwrap_or("an unbound sample"),
            });
        }
        if self.storage.capacity() - self.storage.len() < count {
            let wanted = self
                .storage
                .len()
                .checked_add(count)
                .ok_or_else(|| self.allocation_error(count))?;
            self.resize(wanted)?;
        }
        match self.storage.extend_from(src.storage.as_ref(), offset, count) {
            Ok(true) => Ok(()),
            Ok(false) => Err(DfgError::BufferType {
                buffer_type: self.data_type.name().to_string(),
                requested: src.data_type.rust_type().unwrap_or("an unbound sample"),
            }),
            Err(reason) => Err(DfgError::SampleCopy {
                type_name: self.data_type.name().to_string(),
                reason,
            }),
        }
    }

    /// Replaces the sample type, discarding all samples.
    ///
    /// Refused with [`DfgError::BufferShared`] while more than one reader is
    /// attached: those readers were connected under the old type.
    pub fn change_type(&mut self, new_type: TypeRef) -> Result<(), DfgError> {
        if *self.data_type == *new_type {
            return Ok(());
        }
        if self.readers() > 1 {
            return Err(DfgError::BufferShared {
                type_name: self.data_type.name().to_string(),
                readers: self.readers(),
            });
        }
        self.storage = new_type.new_storage();
        self.data_type = new_type;
        Ok(())
    }

    /// Renders sample `index` with the type's to-string converter.
    pub fn format_sample(&self, index: usize) -> Option<String> {
        self.storage.format_sample(index)
    }

    /// Renders every sample. Samples without a converter show as `?`.
    pub fn format_all(&self) -> Vec<String> {
        (0..self.len())
            .map(|i| self.format_sample(i).unwrap_or_else(|| "?".to_string()))
            .collect()
    }

    /// Parses `text` with the type's from-string converter and appends it.
    pub fn push_parsed(&mut self, text: &str) -> Result<(), DfgError> {
        if self.storage.push_parsed(text) {
            Ok(())
        } else {
            Err(DfgError::failure(format!(
                "'{text}' is not a valid {} sample",
                self.data_type.name()
            )))
        }
    }

    fn allocation_error(&self, requested: usize) -> DfgError {
        DfgError::Allocation {
            type_name: self.data_type.name().to_string(),
            requested,
        }
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("type", &self.data_type.name())
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("refs", &self.refs)
            .finish()
    }
}

fn downcast_ref<'a, T: Sample>(
    storage: &'a dyn SampleStorage,
    data_type: &DataType,
) -> Result<&'a Vec<T>, DfgError> {
    storage
        .as_any()
        .downcast_ref::<Vec<T>>()
        .ok_or_else(|| DfgError::BufferType {
            buffer_type: data_type.name().to_string(),
            requested: type_name::<T>(),
        })
}

fn downcast_mut<'a, T: Sample>(
    storage: &'a mut dyn SampleStorage,
    data_type: &DataType,
) -> Result<&'a mut Vec<T>, DfgError> {
    storage
        .as_any_mut()
        .downcast_mut::<Vec<T>>()
        .ok_or_else(|| DfgError::BufferType {
            buffer_type: data_type.name().to_string(),
            requested: type_name::<T>(),
        })
}
