#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::redundant_pub_crate)]

//! Serializable events with persistent, reflection-resolved listeners.
//!
//! An [`Event`] carries two kinds of listeners:
//!
//! - **Persistent listeners** are plain records (target, method name, mode,
//!   cached argument) that serialize with the event. Before the first
//!   invocation after any change, each record is resolved by name through
//!   the [`TypeRegistry`] into a callable binding.
//! - **Runtime listeners** are live [`Action`]s added in code. They are
//!   never serialized.
//!
//! Invocation runs the persistent listeners first, then the runtime ones,
//! each tier in insertion order.
//!
//! # Example
//!
//! ```ignore
//! use uevent::prelude::*;
//!
//! #[derive(ObjectType)]
//! #[object(methods = Door::methods)]
//! pub struct Door {
//!     open: AtomicBool,
//! }
//!
//! impl Door {
//!     fn methods(builder: &mut TypeBuilder<Self>) {
//!         builder.method0("open", |door: &Door| door.open.store(true, Ordering::Relaxed));
//!     }
//! }
//!
//! let mut objects = Objects::new();
//! let door = ObjectRef::new(&objects.spawn(Door { open: AtomicBool::new(false) }));
//!
//! let mut on_click = Event0::new();
//! let open = Runtime::global().action::<()>(&door, "open").unwrap();
//! on_click.add_persistent(&open, CallState::RuntimeOnly)?;
//!
//! let json = serde_json::to_string(&on_click)?;
//! let mut restored: Event0 = serde_json::from_str(&json)?;
//! restored.on_after_deserialize(&objects);
//! restored.invoke()?;
//! ```

mod action;
mod argument;
mod args;
mod call_list;
mod error;
mod event;
mod invokable;
mod object;
mod persistent;
pub mod reflect;
mod runtime;

pub use action::{Action, Action0, Action1, Action2, Action3, Action4};
pub use argument::{ArgumentCache, tidy_type_name};
pub use args::{ArgBuffer, ArgList};
pub use call_list::InvokableCallList;
pub use error::EventError;
pub use event::{
    Event, Event0, Event1, Event2, Event3, Event4, EventBase, EventContext, EventSignature,
    Signature,
};
pub use invokable::{CachedInvokableCall, Invokable, InvokableCall};
pub use inventory;
pub use object::{AnyObject, Handle, Instance, InstanceId, ObjectRef, Objects};
pub use persistent::{CallState, ListenerMode, ListenerStatus, PersistentCall, PersistentCallGroup};
pub use reflect::{
    MethodHandle, MethodKey, ObjectType, ParamKind, ParamType, TypeBuilder, TypeInfo,
    TypeRegistration, TypeRegistry, register_type,
};
pub use runtime::{Runtime, RuntimeBuilder};
pub use uevent_derive::ObjectType;

/// Commonly used types.
pub mod prelude {
    pub use crate::{
        Action, Action0, Action1, Action2, Action3, Action4, CallState, Event, Event0, Event1,
        Event2, Event3, Event4, EventError, ListenerMode, ObjectRef, ObjectType, Objects, Runtime,
        TypeBuilder,
    };
}
