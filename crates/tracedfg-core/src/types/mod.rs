//! Sample types flowing through buffers.
//!
//! A sample type is described by a [`DataType`]: a unique namespaced name
//! (`"am::core::double"`), the byte size of one sample, and the behaviour
//! attached to its Rust representation through the [`Sample`] trait (copy,
//! destruction, string conversion).
//!
//! # Design
//!
//! Each concrete type is backed by a Rust type implementing [`Sample`]. The
//! [`DataType`] erases that type behind a small factory object so buffers can
//! be allocated, retyped and inspected without knowing the sample type at
//! compile time, while node implementations still read and write typed slices.
//!
//! The wildcard type [`ANY_TYPE_NAME`] has no backing representation. It is
//! only valid on ports that resolve their concrete type when connected.
//!
//! # Example
//!
//! ```rust
//! use tracedfg_core::types::{DataType, types_compatible};
//!
//! let double = DataType::new::<f64>("am::core::double");
//! let uint = DataType::new::<u64>("am::core::uint64");
//! let any = DataType::any();
//!
//! assert!(types_compatible(&double, &double));
//! assert!(types_compatible(&any, &uint));
//! assert!(!types_compatible(&double, &uint));
//! ```

pub mod builtin;
pub mod registry;
pub mod storage;

pub use builtin::{Interval, NamedSample, Timestamp};
pub use registry::TypeRegistry;
pub use storage::SampleStorage;

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::{needs_drop, size_of};
use std::sync::Arc;

/// Name of the wildcard type.
pub const ANY_TYPE_NAME: &str = "am::core::any";

/// Shared handle to a registered sample type.
pub type TypeRef = Arc<DataType>;

/// Rust representation of a sample type.
///
/// `Clone` is the default copy function and `Drop` is the destructor. Types
/// that own resources get both for free; types whose copy can fail override
/// [`copy_sample`](Self::copy_sample).
pub trait Sample: Clone + Default + fmt::Debug + Send + 'static {
    /// Copies one sample into a buffer. A failure aborts the write in progress.
    fn copy_sample(&self) -> Result<Self, String> {
        Ok(self.clone())
    }

    /// Renders the sample as text, if the type supports it.
    fn to_text(&self) -> Option<String> {
        None
    }

    /// Parses a sample from text, if the type supports it.
    fn from_text(_text: &str) -> Option<Self> {
        None
    }
}

/// Type-erased operations of a concrete sample type.
trait SampleKind: Send + Sync {
    fn new_storage(&self) -> Box<dyn SampleStorage>;
    fn rust_type(&self) -> &'static str;
    fn sample_size(&self) -> usize;
    fn has_destructor(&self) -> bool;
    fn check_string(&self, text: &str) -> bool;
}

struct TypedKind<T>(PhantomData<fn() -> T>);

impl<T: Sample> SampleKind for TypedKind<T> {
    fn new_storage(&self) -> Box<dyn SampleStorage> {
        Box::new(Vec::<T>::new())
    }

    fn rust_type(&self) -> &'static str {
        type_name::<T>()
    }

    fn sample_size(&self) -> usize {
        size_of::<T>()
    }

    fn has_destructor(&self) -> bool {
        needs_drop::<T>()
    }

    fn check_string(&self, text: &str) -> bool {
        T::from_text(text).is_some()
    }
}

/// Description of a sample type.
///
/// Two `DataType`s are equal iff their names are equal; a [`TypeRegistry`]
/// guarantees that names are unique.
pub struct DataType {
    name: String,
    kind: Option<Box<dyn SampleKind>>,
}

impl DataType {
    /// Creates a concrete type backed by the Rust type `T`.
    pub fn new<T: Sample>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(Box::new(TypedKind::<T>(PhantomData))),
        }
    }

    /// Creates the wildcard type.
    pub fn any() -> Self {
        Self {
            name: ANY_TYPE_NAME.to_string(),
            kind: None,
        }
    }

    /// Registered name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` for the wildcard type.
    pub fn is_any(&self) -> bool {
        self.kind.is_none()
    }

    /// Size of one sample in bytes (0 for the wildcard).
    pub fn sample_size(&self) -> usize {
        self.kind.as_ref().map_or(0, |k| k.sample_size())
    }

    /// Returns `true` if samples own resources that must be released.
    pub fn has_destructor(&self) -> bool {
        self.kind.as_ref().is_some_and(|k| k.has_destructor())
    }

    /// Name of the backing Rust type, or `None` for the wildcard.
    pub fn rust_type(&self) -> Option<&'static str> {
        self.kind.as_ref().map(|k| k.rust_type())
    }

    /// Returns `true` if `text` parses as a sample of this type.
    pub fn check_string(&self, text: &str) -> bool {
        self.kind.as_ref().is_some_and(|k| k.check_string(text))
    }

    /// Allocates empty storage for samples of this type.
    ///
    /// The wildcard type gets storage that can never hold samples.
    pub fn new_storage(&self) -> Box<dyn SampleStorage> {
        match &self.kind {
            Some(kind) => kind.new_storage(),
            None => Box::new(storage::Unbound),
        }
    }
}

impl PartialEq for DataType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for DataType {}

impl fmt::Debug for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataType")
            .field("name", &self.name)
            .field("rust_type", &self.rust_type())
            .finish()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Returns `true` if samples of `src` may flow into a port declared as `dst`.
///
/// This is the only compatibility rule used by connection validation: equal
/// types, or the wildcard on either side.
pub fn types_compatible(src: &DataType, dst: &DataType) -> bool {
    src.is_any() || dst.is_any() || src == dst
}
