//! The `ObjectType` trait for host objects that can be listener targets.

use crate::reflect::TypeBuilder;
use crate::reflect::param::{qualified_name, short_name};

/// Trait for types that live in the host object table and can be targeted
/// by persistent listeners.
///
/// This trait is typically derived using `#[derive(ObjectType)]`, which also
/// submits the type to the global registry.
///
/// # Example
///
/// ```ignore
/// use uevent::{ObjectType, TypeBuilder};
///
/// #[derive(ObjectType)]
/// #[object(methods = Door::methods)]
/// pub struct Door {
///     open: AtomicBool,
/// }
///
/// impl Door {
///     fn methods(builder: &mut TypeBuilder<Self>) {
///         builder.method1("set_open", |door: &Door, open: bool| {
///             door.open.store(open, Ordering::Relaxed);
///         });
///     }
/// }
/// ```
pub trait ObjectType: Send + Sync + Sized + 'static {
    /// Get the short type name (without module path).
    fn type_name() -> &'static str {
        short_name(core::any::type_name::<Self>())
    }

    /// Get the full type name (with module path).
    fn full_type_name() -> &'static str {
        core::any::type_name::<Self>()
    }

    /// Type identifier persisted alongside object arguments: `path::Type, crate`.
    fn qualified_type_name() -> String {
        qualified_name(Self::full_type_name())
    }

    /// Describe the methods persistent listeners may bind to.
    ///
    /// Called once per registration; the resulting table is cached by the
    /// [`TypeRegistry`](crate::reflect::TypeRegistry).
    fn describe(_builder: &mut TypeBuilder<Self>) {}
}
