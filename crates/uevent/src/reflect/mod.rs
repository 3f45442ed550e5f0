//! Reflection layer: per-type method tables and the closed type registry.
//!
//! Persistent listeners store a method *name*. Resolving that name into a
//! callable goes through the [`TypeRegistry`], which holds one method table
//! per [`ObjectType`], built once by [`ObjectType::describe`] when the type is
//! registered.

mod builder;
mod method;
pub(crate) mod param;
mod registry;
mod traits;

pub use builder::TypeBuilder;
pub use method::{MethodHandle, MethodKey};
pub use param::{ParamKind, ParamType, is_primitive_type};
pub use registry::{TypeInfo, TypeRegistration, TypeRegistry, register_type};
pub use traits::ObjectType;
