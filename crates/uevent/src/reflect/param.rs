//! Parameter type descriptors used for signature matching.

use core::any::TypeId;
use core::fmt;

use crate::object::ObjectRef;
use crate::reflect::ObjectType;

/// Coarse classification of a parameter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Scalar primitives: `bool`, `char`, integers and floats.
    Primitive,
    /// Any other by-value type (`String`, user structs, ...).
    Value,
    /// A reference to a host object.
    Object,
}

/// Descriptor of a single method or event parameter.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamType {
    kind: ParamKind,
    type_id: TypeId,
    name: &'static str,
}

impl ParamType {
    /// Descriptor for a Rust value type.
    ///
    /// [`ObjectRef`] maps to the base object type; everything else is a
    /// primitive or value type depending on [`is_primitive_type`].
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        let type_id = TypeId::of::<T>();
        if type_id == TypeId::of::<ObjectRef>() {
            return Self::base_object();
        }

        let kind = if is_primitive_type(type_id) {
            ParamKind::Primitive
        } else {
            ParamKind::Value
        };

        Self {
            kind,
            type_id,
            name: short_name(core::any::type_name::<T>()),
        }
    }

    /// The base object type every host object is assignable to.
    #[must_use]
    pub fn base_object() -> Self {
        Self {
            kind: ParamKind::Object,
            type_id: TypeId::of::<ObjectRef>(),
            name: "Object",
        }
    }

    /// Reference to a specific host object type.
    #[must_use]
    pub fn object_of<T: ObjectType>() -> Self {
        Self::object(TypeId::of::<T>(), T::type_name())
    }

    /// Reference to a host object type known only by id and name.
    #[must_use]
    pub const fn object(type_id: TypeId, name: &'static str) -> Self {
        Self {
            kind: ParamKind::Object,
            type_id,
            name,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ParamKind {
        self.kind
    }

    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn is_primitive(&self) -> bool {
        self.kind == ParamKind::Primitive
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.kind == ParamKind::Object
    }

    #[must_use]
    pub fn is_base_object(&self) -> bool {
        self.is_object() && self.type_id == TypeId::of::<ObjectRef>()
    }
}

impl fmt::Debug for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({})", self.kind, self.name)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Whether a type is one of the scalar primitives.
///
/// `String` is not primitive: a `String` parameter never
/// matches a numeric request.
#[must_use]
pub fn is_primitive_type(type_id: TypeId) -> bool {
    [
        TypeId::of::<bool>(),
        TypeId::of::<char>(),
        TypeId::of::<i8>(),
        TypeId::of::<i16>(),
        TypeId::of::<i32>(),
        TypeId::of::<i64>(),
        TypeId::of::<isize>(),
        TypeId::of::<u8>(),
        TypeId::of::<u16>(),
        TypeId::of::<u32>(),
        TypeId::of::<u64>(),
        TypeId::of::<usize>(),
        TypeId::of::<f32>(),
        TypeId::of::<f64>(),
    ]
    .contains(&type_id)
}

pub(crate) fn short_name(full: &'static str) -> &'static str {
    // Leave generic paths alone, their last segment is not a name.
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

/// `path::Type, crate` identifier for a full type name.
pub(crate) fn qualified_name(full: &str) -> String {
    let krate = full.split("::").next().unwrap_or(full);
    format!("{full}, {krate}")
}
