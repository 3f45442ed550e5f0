//! The live environment events resolve against.

use core::any::TypeId;
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock};

use parking_lot::{RwLock, RwLockReadGuard};

use crate::action::Action;
use crate::args::ArgList;
use crate::object::ObjectRef;
use crate::reflect::{MethodHandle, ObjectType, ParamType, TypeRegistry};

static GLOBAL: LazyLock<Arc<Runtime>> = LazyLock::new(|| Arc::new(Runtime::from_inventory()));

/// Type registry plus the "playing" predicate.
///
/// One runtime is shared by any number of events. Listeners whose call state
/// is `RuntimeOnly` only resolve while the runtime is playing.
pub struct Runtime {
    types: RwLock<TypeRegistry>,
    playing: AtomicBool,
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Runtime {
    /// Create a playing runtime with an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(TypeRegistry::new(), true)
    }

    fn with_registry(types: TypeRegistry, playing: bool) -> Self {
        Self {
            types: RwLock::new(types),
            playing: AtomicBool::new(playing),
        }
    }

    #[must_use]
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::default()
    }

    /// Create a playing runtime holding every derive-registered type.
    #[must_use]
    pub fn from_inventory() -> Self {
        Self::with_registry(TypeRegistry::from_inventory(), true)
    }

    /// The process-wide runtime, built on first use from the inventory.
    ///
    /// New and deserialized events resolve against it unless given another.
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Read access to the type registry.
    ///
    /// Do not hold the guard across a call back into the runtime.
    pub fn types(&self) -> RwLockReadGuard<'_, TypeRegistry> {
        self.types.read()
    }

    /// Register a host object type after construction.
    pub fn register<T: ObjectType>(&self) {
        self.types.write().register::<T>();
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Acquire)
    }

    /// Toggle the playing state.
    ///
    /// Events only consult it when they rebuild their persistent calls.
    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::Release);
    }

    /// Look up a method by name and parameter types.
    #[must_use]
    pub fn find_method(
        &self,
        target_type: TypeId,
        name: &str,
        params: &[ParamType],
    ) -> Option<MethodHandle> {
        self.types().find_method(target_type, name, params)
    }

    /// Parameter type for a persisted object type identifier.
    ///
    /// Empty or unknown identifiers fall back to the base object type.
    #[must_use]
    pub fn object_param_type(&self, type_name: &str) -> ParamType {
        self.types()
            .resolve_type_name(type_name)
            .map_or_else(ParamType::base_object, |info| info.param_type())
    }

    /// Parameter type of the object behind `reference`.
    ///
    /// Null, unlinked and unregistered objects map to the base object type.
    #[must_use]
    pub fn param_type_of(&self, reference: &ObjectRef) -> ParamType {
        reference
            .value_type_id()
            .and_then(|type_id| self.types().get(type_id).map(|info| info.param_type()))
            .unwrap_or_else(ParamType::base_object)
    }

    /// Whether the object behind `reference` binds to a `param` parameter.
    ///
    /// Unreachable objects are assignable to anything.
    #[must_use]
    pub fn is_assignable(&self, reference: &ObjectRef, param: &ParamType) -> bool {
        if param.is_base_object() {
            return true;
        }
        reference
            .value_type_id()
            .is_none_or(|type_id| self.types().is_assignable(type_id, param.type_id()))
    }

    /// Bind the method `name` of `target` taking exactly `Args`.
    ///
    /// Returns `None` if the target is unreachable or has no such method.
    #[must_use]
    pub fn action<Args: ArgList>(&self, target: &ObjectRef, name: &str) -> Option<Action<Args>> {
        let method = self.find_method(target.value_type_id()?, name, &Args::param_types())?;
        Action::from_method(target, &method).ok()
    }

    /// Bind the method `name` of `target` taking a reference to an `L`.
    #[must_use]
    pub fn object_action<L: ObjectType>(
        &self,
        target: &ObjectRef,
        name: &str,
    ) -> Option<Action<(ObjectRef,)>> {
        let method = self.find_method(
            target.value_type_id()?,
            name,
            &[ParamType::object_of::<L>()],
        )?;
        Action::from_method(target, &method).ok()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("types", &self.types().len())
            .field("playing", &self.is_playing())
            .finish()
    }
}

/// Builder for a [`Runtime`].
pub struct RuntimeBuilder {
    types: TypeRegistry,
    playing: bool,
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self {
            types: TypeRegistry::new(),
            playing: true,
        }
    }
}

impl RuntimeBuilder {
    /// Add every derive-registered type.
    #[must_use]
    pub fn with_inventory(mut self) -> Self {
        for registration in inventory::iter::<crate::reflect::TypeRegistration> {
            registration.apply(&mut self.types);
        }
        self
    }

    /// Add a single type.
    #[must_use]
    pub fn register<T: ObjectType>(mut self) -> Self {
        self.types.register::<T>();
        self
    }

    /// Initial playing state (default `true`).
    #[must_use]
    pub const fn playing(mut self, playing: bool) -> Self {
        self.playing = playing;
        self
    }

    #[must_use]
    pub fn build(self) -> Runtime {
        Runtime::with_registry(self.types, self.playing)
    }

    /// Build straight into a shared handle.
    #[must_use]
    pub fn shared(self) -> Arc<Runtime> {
        Arc::new(self.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::Objects;
    use crate::reflect::TypeBuilder;
    use std::sync::atomic::AtomicI32;

    struct Counter {
        value: AtomicI32,
    }

    impl ObjectType for Counter {
        fn describe(builder: &mut TypeBuilder<Self>) {
            builder.method1("add", |counter: &Counter, amount: i32| {
                counter.value.fetch_add(amount, Ordering::Relaxed);
            });
        }
    }

    #[test]
    fn test_builder_defaults() {
        let runtime = Runtime::builder().register::<Counter>().build();
        assert!(runtime.is_playing());
        assert_eq!(runtime.types().len(), 1);

        let paused = Runtime::builder().playing(false).build();
        assert!(!paused.is_playing());
        assert!(paused.types().is_empty());
    }

    #[test]
    fn test_action_binds_registered_method() {
        let runtime = Runtime::builder().register::<Counter>().build();
        let mut objects = Objects::new();
        let counter = objects.spawn(Counter {
            value: AtomicI32::new(0),
        });
        let target = ObjectRef::new(&counter);

        let add = runtime.action::<(i32,)>(&target, "add").unwrap();
        add.call((5,)).unwrap();
        assert_eq!(counter.value.load(Ordering::Relaxed), 5);
        assert_eq!(add.method_name(), Some("add"));

        assert!(runtime.action::<(f32,)>(&target, "add").is_none());
        assert!(runtime.action::<(i32,)>(&ObjectRef::null(), "add").is_none());
    }

    #[test]
    fn test_unknown_object_type_falls_back_to_base() {
        let runtime = Runtime::new();
        assert!(runtime.object_param_type("").is_base_object());
        assert!(runtime.object_param_type("nowhere::Thing, nowhere").is_base_object());
        assert!(runtime.param_type_of(&ObjectRef::null()).is_base_object());
    }
}
