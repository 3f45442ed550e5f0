//! Events of a fixed argument signature.

use core::fmt;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::EventError;
use crate::action::Action;
use crate::args::ArgList;
use crate::event::{EventBase, Signature};
use crate::invokable::{Invokable, InvokableCall};
use crate::persistent::CallState;
use crate::runtime::Runtime;

/// A serializable event whose listeners take `Args`.
///
/// Use the aliases [`Event0`] through [`Event4`]. Everything that does not
/// depend on the argument types lives on [`EventBase`], reachable through
/// `Deref`.
///
/// # Example
///
/// ```ignore
/// let mut on_damage: Event2<i32, String> = Event2::new();
/// on_damage.add_listener(Action2::new(|amount, source| { /* ... */ }));
/// on_damage.invoke(10, "lava".to_string())?;
/// ```
pub struct Event<Args: ArgList> {
    base: EventBase,
    _args: PhantomData<fn(Args)>,
}

impl<Args: ArgList> Event<Args> {
    /// Create an event resolving against [`Runtime::global`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_runtime(Runtime::global())
    }

    #[must_use]
    pub fn with_runtime(runtime: Arc<Runtime>) -> Self {
        Self {
            base: EventBase::new(Arc::new(Signature::<Args>::new()), runtime),
            _args: PhantomData,
        }
    }

    #[must_use]
    pub fn base(&self) -> &EventBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }

    /// Add a runtime listener.
    pub fn add_listener(&mut self, call: Action<Args>) {
        self.base.add_call(Arc::new(InvokableCall::from_action(call)));
    }

    /// Remove runtime listeners with the same target and method as `call`.
    pub fn remove_listener(&mut self, call: &Action<Args>) -> usize {
        self.base.remove_call(call.target(), call.method_key())
    }

    /// Register `call` on the record at `index` as an event-defined listener.
    ///
    /// Fails if `index` is out of range or `call` has no target or no method
    /// name; returns `Ok(false)` if the method cannot be resolved.
    pub fn register_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<Args>,
    ) -> Result<bool, EventError> {
        let count = self.base.persistent_event_count();
        if index >= count {
            return Err(EventError::IndexOutOfRange { index, count });
        }
        let Some(target) = call.target() else {
            return Err(EventError::StaticListener(
                call.method_name().unwrap_or("<closure>").to_owned(),
            ));
        };
        let name = call.method_name().ok_or(EventError::NullArgument("method"))?;
        self.base.register_event_persistent_listener(index, target, name)
    }

    /// Append a record and register `call` on it with `state`.
    ///
    /// If registration fails the new record stays in place, empty.
    pub fn add_persistent(
        &mut self,
        call: &Action<Args>,
        state: CallState,
    ) -> Result<bool, EventError> {
        let index = self.base.persistent_event_count();
        self.base.add_persistent_listener();
        let registered = self.register_persistent_listener(index, call)?;
        self.base.set_persistent_listener_state(index, state)?;
        Ok(registered)
    }

    /// Invoke every listener with `args`, persistent listeners first.
    ///
    /// Each invocation erases into its own argument buffer.
    pub fn dispatch(&mut self, args: Args) -> Result<(), EventError> {
        let buffer = args.to_args();
        self.base.invoke_erased(&buffer)
    }

    /// A plain delegate running the listeners this event has now.
    ///
    /// Returns `None` for an event without persistent records, so callers
    /// can skip dispatch entirely. Records edited later are not seen by the
    /// returned action.
    pub fn to_callback(&mut self) -> Option<Action<Args>> {
        if self.base.persistent_event_count() == 0 {
            return None;
        }
        let calls: Vec<Arc<dyn Invokable>> = self.base.prepare_invoke().to_vec();
        Some(Action::from_fn(move |args: Args| {
            let buffer = args.to_args();
            for call in &calls {
                call.invoke(&buffer)?;
            }
            Ok(())
        }))
    }
}

macro_rules! impl_event_invoke {
    ($($ty:ident $var:ident),*) => {
        impl<$($ty: Clone + 'static),*> Event<($($ty,)*)> {
            /// Invoke every listener, persistent listeners first.
            pub fn invoke(&mut self, $($var: $ty),*) -> Result<(), EventError> {
                self.dispatch(($($var,)*))
            }
        }
    };
}

impl_event_invoke!();
impl_event_invoke!(A a);
impl_event_invoke!(A a, B b);
impl_event_invoke!(A a, B b, C c);
impl_event_invoke!(A a, B b, C c, D d);

/// Zero-argument event.
pub type Event0 = Event<()>;
/// One-argument event.
pub type Event1<A> = Event<(A,)>;
/// Two-argument event.
pub type Event2<A, B> = Event<(A, B)>;
/// Three-argument event.
pub type Event3<A, B, C> = Event<(A, B, C)>;
/// Four-argument event.
pub type Event4<A, B, C, D> = Event<(A, B, C, D)>;

impl<Args: ArgList> Default for Event<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: ArgList> Deref for Event<Args> {
    type Target = EventBase;

    fn deref(&self) -> &EventBase {
        &self.base
    }
}

impl<Args: ArgList> DerefMut for Event<Args> {
    fn deref_mut(&mut self) -> &mut EventBase {
        &mut self.base
    }
}

impl<Args: ArgList> fmt::Debug for Event<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Event").field(&self.base).finish()
    }
}

impl<Args: ArgList> Serialize for Event<Args> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.base.serialize(serializer)
    }
}

impl<'de, Args: ArgList> Deserialize<'de> for Event<Args> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut base = EventBase::deserialize(deserializer)?;
        base.set_signature(Arc::new(Signature::<Args>::new()));
        Ok(Self {
            base,
            _args: PhantomData,
        })
    }
}
