//! Type-erased method handles.

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::EventError;
use crate::object::AnyObject;
use crate::reflect::ParamType;

/// Erased method body: receives the target payload and the argument buffer.
pub(crate) type MethodFn =
    dyn Fn(&AnyObject, &[&dyn Any]) -> Result<(), EventError> + Send + Sync;

/// Global counter for generating unique method keys.
static NEXT_METHOD_KEY: AtomicU64 = AtomicU64::new(1);

/// Identity of a callable: a registered method or a runtime closure.
///
/// Two calls are "the same method" exactly when their keys are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodKey(u64);

impl MethodKey {
    /// Allocate a fresh key.
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_METHOD_KEY.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw key value.
    #[must_use]
    pub const fn as_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for MethodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodKey({})", self.0)
    }
}

/// A method registered on a host object type.
#[derive(Clone)]
pub struct MethodHandle {
    key: MethodKey,
    name: &'static str,
    declaring_type: &'static str,
    params: Arc<[ParamType]>,
    call: Arc<MethodFn>,
}

impl MethodHandle {
    pub(crate) fn new(
        name: &'static str,
        declaring_type: &'static str,
        params: Vec<ParamType>,
        call: Arc<MethodFn>,
    ) -> Self {
        Self {
            key: MethodKey::next(),
            name,
            declaring_type,
            params: params.into(),
            call,
        }
    }

    /// Re-target this method through a projection, keeping its identity.
    ///
    /// Used to expose an ancestor's methods on a composed type.
    pub(crate) fn with_call(&self, call: Arc<MethodFn>) -> Self {
        Self {
            call,
            ..self.clone()
        }
    }

    #[must_use]
    pub fn key(&self) -> MethodKey {
        self.key
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Short name of the type that declared the method.
    #[must_use]
    pub fn declaring_type(&self) -> &'static str {
        self.declaring_type
    }

    #[must_use]
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// Call the method on `target`.
    pub fn invoke(&self, target: &AnyObject, args: &[&dyn Any]) -> Result<(), EventError> {
        (self.call)(target, args)
    }
}

impl fmt::Debug for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodHandle")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("declaring_type", &self.declaring_type)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for MethodHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}(", self.declaring_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}
