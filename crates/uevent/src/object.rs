//! Host objects that listeners bind to.
//!
//! Listener targets are owned by the host (a scene, a level, an editor
//! document). Events only ever hold [`ObjectRef`]s: non-owning references
//! that carry the target's [`InstanceId`] so they survive serialization and
//! can be relinked afterwards.
//!
//! An object can be *destroyed but not null*: [`Objects::destroy`] marks the
//! instance dead while outside handles keep the allocation around. Every
//! reference to it then reports `is_alive() == false`, which is what the
//! dispatch path checks before each call.

use core::any::{Any, TypeId};
use core::fmt;
use core::ops::Deref;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::reflect::ObjectType;

/// Type-erased object payload.
pub type AnyObject = dyn Any + Send + Sync;

/// Identity of a host object. `0` is the null id.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(i64);

impl InstanceId {
    /// The null id.
    pub const NONE: Self = Self(0);

    /// Create an id from a raw value.
    #[must_use]
    pub const fn from_raw(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Whether this is a real (non-zero) id.
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InstanceId({})", self.0)
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A host object together with its identity and liveness.
pub struct Instance<T: ?Sized + Send + Sync + 'static> {
    id: InstanceId,
    type_id: TypeId,
    type_name: &'static str,
    qualified_name: String,
    destroyed: AtomicBool,
    value: T,
}

/// Shared handle to a typed host object.
pub type Handle<T> = Arc<Instance<T>>;

impl<T: ObjectType> Instance<T> {
    fn new(id: InstanceId, value: T) -> Self {
        Self {
            id,
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            qualified_name: T::qualified_type_name(),
            destroyed: AtomicBool::new(false),
            value,
        }
    }
}

impl<T: ?Sized + Send + Sync + 'static> Instance<T> {
    /// The object's id.
    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// `TypeId` of the concrete payload.
    #[must_use]
    pub fn value_type_id(&self) -> TypeId {
        self.type_id
    }

    /// Short registered type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Qualified type identifier (`path::Type, crate`).
    #[must_use]
    pub fn qualified_type_name(&self) -> &str {
        &self.qualified_name
    }

    /// Whether the object has not been destroyed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self.destroyed.load(Ordering::Acquire)
    }

    /// Borrow the payload.
    #[must_use]
    pub fn value(&self) -> &T {
        &self.value
    }

    fn mark_destroyed(&self) {
        self.destroyed.store(true, Ordering::Release);
    }
}

impl<T: ?Sized + Send + Sync + 'static> Deref for Instance<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: ?Sized + Send + Sync + 'static> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("id", &self.id)
            .field("type", &self.type_name)
            .field("alive", &self.is_alive())
            .finish_non_exhaustive()
    }
}

/// Non-owning reference to a host object.
///
/// Serializes as `{"instanceID": id}`; a freshly deserialized reference is
/// unlinked until [`Objects::relink`] binds it to the live instance again.
#[derive(Clone, Default)]
pub struct ObjectRef {
    id: InstanceId,
    ptr: Option<Weak<Instance<AnyObject>>>,
}

impl ObjectRef {
    /// The null reference.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            id: InstanceId::NONE,
            ptr: None,
        }
    }

    /// Reference a typed handle.
    #[must_use]
    pub fn new<T: ObjectType>(handle: &Handle<T>) -> Self {
        let erased: Arc<Instance<AnyObject>> = handle.clone();
        Self::from_erased(&erased)
    }

    /// Reference a type-erased instance.
    #[must_use]
    pub fn from_erased(instance: &Arc<Instance<AnyObject>>) -> Self {
        Self {
            id: instance.id(),
            ptr: Some(Arc::downgrade(instance)),
        }
    }

    /// An unlinked reference carrying only an id.
    #[must_use]
    pub const fn from_id(id: InstanceId) -> Self {
        Self { id, ptr: None }
    }

    #[must_use]
    pub fn id(&self) -> InstanceId {
        self.id
    }

    /// Whether this reference names no object at all.
    #[must_use]
    pub fn is_null(&self) -> bool {
        !self.id.is_valid()
    }

    /// Whether the reference has been bound to an instance.
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.ptr.is_some()
    }

    /// Upgrade to the instance, even if it has been destroyed.
    #[must_use]
    pub fn upgrade(&self) -> Option<Arc<Instance<AnyObject>>> {
        self.ptr.as_ref().and_then(Weak::upgrade)
    }

    /// Upgrade to the instance only if it is still alive.
    #[must_use]
    pub fn get(&self) -> Option<Arc<Instance<AnyObject>>> {
        self.upgrade().filter(|instance| instance.is_alive())
    }

    /// Liveness check performed before every call into the target.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.get().is_some()
    }

    /// `TypeId` of the referenced object, if it can still be reached.
    #[must_use]
    pub fn value_type_id(&self) -> Option<TypeId> {
        self.upgrade().map(|instance| instance.value_type_id())
    }

    /// Run `f` against the payload if it is alive and of type `T`.
    pub fn with<T: 'static, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let instance = self.get()?;
        let value = instance.value().downcast_ref::<T>()?;
        Some(f(value))
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(instance) => write!(
                f,
                "ObjectRef({} {}{})",
                instance.type_name(),
                self.id,
                if instance.is_alive() { "" } else { " destroyed" }
            ),
            None if self.is_null() => f.write_str("ObjectRef(null)"),
            None => write!(f, "ObjectRef({} unlinked)", self.id),
        }
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(instance) => write!(f, "{} ({})", instance.type_name(), self.id),
            None => f.write_str("null"),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ObjectRefRepr {
    #[serde(rename = "instanceID", default)]
    instance_id: InstanceId,
}

impl Serialize for ObjectRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ObjectRefRepr {
            instance_id: self.id,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ObjectRefRepr::deserialize(deserializer)?;
        Ok(Self::from_id(repr.instance_id))
    }
}

/// Table of live host objects.
///
/// Ids are allocated from 1 upward and never reused, so a stale reference
/// can never alias a newer object.
pub struct Objects {
    next_id: i64,
    live: HashMap<InstanceId, Arc<Instance<AnyObject>>>,
}

impl Default for Objects {
    fn default() -> Self {
        Self::new()
    }
}

impl Objects {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            live: HashMap::new(),
        }
    }

    /// Add an object and return a typed handle to it.
    pub fn spawn<T: ObjectType>(&mut self, value: T) -> Handle<T> {
        let id = InstanceId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.insert(id, value)
    }

    /// Add an object under a fixed id, e.g. when loading a saved scene.
    ///
    /// Any object already registered under `id` is destroyed first. The
    /// allocator saturates at `i64::MAX`.
    pub fn spawn_with_id<T: ObjectType>(&mut self, id: InstanceId, value: T) -> Handle<T> {
        self.destroy(id);
        self.next_id = self.next_id.max(id.get().saturating_add(1));
        self.insert(id, value)
    }

    fn insert<T: ObjectType>(&mut self, id: InstanceId, value: T) -> Handle<T> {
        let handle = Arc::new(Instance::new(id, value));
        let erased: Arc<Instance<AnyObject>> = handle.clone();
        if let Some(replaced) = self.live.insert(id, erased) {
            replaced.mark_destroyed();
        }
        handle
    }

    /// Destroy an object. Returns `true` if it was alive.
    ///
    /// Outstanding handles keep the memory, but the object reports itself
    /// dead from here on.
    pub fn destroy(&mut self, id: InstanceId) -> bool {
        match self.live.remove(&id) {
            Some(instance) => {
                instance.mark_destroyed();
                true
            }
            None => false,
        }
    }

    /// Get a reference to a live object.
    #[must_use]
    pub fn get(&self, id: InstanceId) -> Option<ObjectRef> {
        self.live.get(&id).map(ObjectRef::from_erased)
    }

    /// Rebind a (deserialized) reference to the live object with its id.
    ///
    /// References to ids that are not in the table stay unlinked.
    pub fn relink(&self, reference: &mut ObjectRef) {
        if reference.is_null() {
            return;
        }
        if let Some(instance) = self.live.get(&reference.id) {
            reference.ptr = Some(Arc::downgrade(instance));
        }
    }

    #[must_use]
    pub fn contains(&self, id: InstanceId) -> bool {
        self.live.contains_key(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.live.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl fmt::Debug for Objects {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Objects")
            .field("live", &self.live.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}
