//! Closed registry of host object types and their method tables.

use core::any::TypeId;
use core::fmt;

use hashbrown::HashMap;

use crate::reflect::{MethodHandle, ObjectType, ParamKind, ParamType, TypeBuilder};

/// Registered information about a host object type.
pub struct TypeInfo {
    type_id: TypeId,
    /// Short type name (e.g., "Light").
    name: &'static str,
    /// Full type name (e.g., "game::scene::Light").
    full_name: &'static str,
    /// Qualified identifier persisted with object arguments.
    qualified_name: String,
    /// Ancestors, nearest first.
    ancestors: Vec<TypeId>,
    /// Method levels: own methods first, then each ancestor's.
    levels: Vec<Vec<MethodHandle>>,
}

impl TypeInfo {
    /// Build the info for `T` by running its method description.
    #[must_use]
    pub fn of<T: ObjectType>() -> Self {
        let mut builder = TypeBuilder::<T>::new();
        T::describe(&mut builder);

        Self {
            type_id: TypeId::of::<T>(),
            name: T::type_name(),
            full_name: T::full_type_name(),
            qualified_name: T::qualified_type_name(),
            ancestors: builder.ancestors,
            levels: builder.levels,
        }
    }

    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn full_name(&self) -> &'static str {
        self.full_name
    }

    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    #[must_use]
    pub fn ancestors(&self) -> &[TypeId] {
        &self.ancestors
    }

    /// Parameter descriptor for a reference to this type.
    #[must_use]
    pub fn param_type(&self) -> ParamType {
        ParamType::object(self.type_id, self.name)
    }

    /// All callable methods, in lookup order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodHandle> {
        self.levels.iter().flatten()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("full_name", &self.full_name)
            .field("ancestors", &self.ancestors.len())
            .field("methods", &self.methods().count())
            .finish()
    }
}

/// Registry of host object types.
///
/// Maps types to their method tables and stable type identifiers back to
/// types, so a persisted type name can be turned into a parameter type again.
#[derive(Default)]
pub struct TypeRegistry {
    /// TypeId -> TypeInfo
    by_id: HashMap<TypeId, TypeInfo>,
    /// Full and short names -> TypeId
    by_name: HashMap<&'static str, TypeId>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every type submitted with
    /// `#[derive(ObjectType)]` (or `inventory::submit!` by hand).
    #[must_use]
    pub fn from_inventory() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<TypeRegistration> {
            registration.apply(&mut registry);
        }
        registry
    }

    /// Register a host object type.
    ///
    /// If the type is already registered, returns the existing info.
    pub fn register<T: ObjectType>(&mut self) -> &TypeInfo {
        let type_id = TypeId::of::<T>();
        if !self.by_id.contains_key(&type_id) {
            let info = TypeInfo::of::<T>();
            self.by_name.insert(info.full_name, type_id);
            // Short names are convenience aliases; the first type wins.
            self.by_name.entry(info.name).or_insert(type_id);
            self.by_id.insert(type_id, info);
        }
        &self.by_id[&type_id]
    }

    #[must_use]
    pub fn get(&self, type_id: TypeId) -> Option<&TypeInfo> {
        self.by_id.get(&type_id)
    }

    /// Get type info by full name, short name, or qualified identifier.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&TypeInfo> {
        let name = name.trim();
        if let Some(id) = self.by_name.get(name) {
            return self.by_id.get(id);
        }
        let (path, _assembly) = name.rsplit_once(", ")?;
        self.by_name.get(path).and_then(|id| self.by_id.get(id))
    }

    /// Resolve a persisted type identifier.
    ///
    /// Returns `None` for empty or unknown identifiers; callers fall back to
    /// the base object type.
    #[must_use]
    pub fn resolve_type_name(&self, name: &str) -> Option<&TypeInfo> {
        if name.is_empty() {
            return None;
        }
        self.get_by_name(&crate::argument::tidy_type_name(name))
    }

    /// Whether a reference to `from` can be passed where `to` is expected.
    #[must_use]
    pub fn is_assignable(&self, from: TypeId, to: TypeId) -> bool {
        from == to || self.get(from).is_some_and(|info| info.ancestors.contains(&to))
    }

    /// Whether an argument of type `requested` binds to a parameter declared
    /// as `declared`.
    ///
    /// Object references are covariant through the registered ancestry;
    /// every other kind must match exactly. On top of that the primitive
    /// classification of both sides has to agree.
    #[must_use]
    pub fn binds(&self, requested: &ParamType, declared: &ParamType) -> bool {
        let assignable = match (requested.kind(), declared.kind()) {
            (ParamKind::Object, ParamKind::Object) => {
                declared.is_base_object()
                    || self.is_assignable(requested.type_id(), declared.type_id())
            }
            _ => requested.type_id() == declared.type_id(),
        };
        assignable && requested.is_primitive() == declared.is_primitive()
    }

    /// Find a method on `target_type` callable with `params`.
    ///
    /// Walks the type's own methods, then each ancestor level in order. The
    /// first level containing an acceptable candidate wins.
    #[must_use]
    pub fn find_method(
        &self,
        target_type: TypeId,
        name: &str,
        params: &[ParamType],
    ) -> Option<MethodHandle> {
        let info = self.get(target_type)?;

        info.levels.iter().find_map(|level| {
            level
                .iter()
                .find(|method| {
                    method.name() == name
                        && method.arity() == params.len()
                        && params
                            .iter()
                            .zip(method.params())
                            .all(|(requested, declared)| self.binds(requested, declared))
                })
                .cloned()
        })
    }

    /// Iterate over all registered types.
    pub fn iter(&self) -> impl Iterator<Item = &TypeInfo> {
        self.by_id.values()
    }

    /// Get the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    /// Check if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("count", &self.len())
            .field("types", &self.by_id.values().collect::<Vec<_>>())
            .finish()
    }
}

/// Compile-time registration of a host object type.
///
/// Submitted by `#[derive(ObjectType)]`; collected by
/// [`TypeRegistry::from_inventory`].
pub struct TypeRegistration {
    register: fn(&mut TypeRegistry),
}

impl TypeRegistration {
    #[must_use]
    pub const fn new(register: fn(&mut TypeRegistry)) -> Self {
        Self { register }
    }

    pub fn apply(&self, registry: &mut TypeRegistry) {
        (self.register)(registry);
    }
}

inventory::collect!(TypeRegistration);

/// Registration function usable in `const` position.
pub fn register_type<T: ObjectType>(registry: &mut TypeRegistry) {
    registry.register::<T>();
}
