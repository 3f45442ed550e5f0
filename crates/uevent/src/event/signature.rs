//! Event signatures and the resolution context handed to persistent calls.

use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::EventError;
use crate::args::ArgList;
use crate::event::Event;
use crate::invokable::{Invokable, InvokableCall};
use crate::object::ObjectRef;
use crate::persistent::{ListenerMode, PersistentCall};
use crate::reflect::param::qualified_name;
use crate::reflect::{MethodHandle, ParamType};
use crate::runtime::Runtime;

/// The argument signature of a concrete event.
///
/// Event-defined persistent listeners are resolved against it and bound
/// through [`delegate`](Self::delegate).
pub trait EventSignature: Send + Sync {
    /// Parameter types of the event's `invoke`.
    fn parameter_types(&self) -> Vec<ParamType>;

    /// Bind `method` on `target` as a call taking the event's arguments.
    fn delegate(
        &self,
        target: &ObjectRef,
        method: &MethodHandle,
    ) -> Result<Arc<dyn Invokable>, EventError>;

    /// Qualified type identifier of the event.
    fn event_type_name(&self) -> String;
}

/// Signature of an [`Event<Args>`].
pub struct Signature<Args>(PhantomData<fn(Args)>);

impl<Args> Signature<Args> {
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<Args> Default for Signature<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: ArgList> EventSignature for Signature<Args> {
    fn parameter_types(&self) -> Vec<ParamType> {
        Args::param_types()
    }

    fn delegate(
        &self,
        target: &ObjectRef,
        method: &MethodHandle,
    ) -> Result<Arc<dyn Invokable>, EventError> {
        let call = InvokableCall::<Args>::new(target, Some(method))?;
        Ok(Arc::new(call))
    }

    fn event_type_name(&self) -> String {
        qualified_name(core::any::type_name::<Event<Args>>())
    }
}

impl<Args> fmt::Debug for Signature<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature<{}>", core::any::type_name::<Args>())
    }
}

/// What a persistent call needs from its event to resolve.
#[derive(Clone, Copy)]
pub struct EventContext<'a> {
    runtime: &'a Runtime,
    signature: &'a dyn EventSignature,
}

impl<'a> EventContext<'a> {
    #[must_use]
    pub fn new(runtime: &'a Runtime, signature: &'a dyn EventSignature) -> Self {
        Self { runtime, signature }
    }

    #[must_use]
    pub fn runtime(&self) -> &'a Runtime {
        self.runtime
    }

    #[must_use]
    pub fn signature(&self) -> &'a dyn EventSignature {
        self.signature
    }

    /// Find `name` on `target` with the parameters `mode` implies.
    ///
    /// Object mode looks for a parameter of `argument_type`, or of the base
    /// object type if none is given.
    #[must_use]
    pub fn find_method(
        &self,
        name: &str,
        target: &ObjectRef,
        mode: ListenerMode,
        argument_type: Option<ParamType>,
    ) -> Option<MethodHandle> {
        let params = match mode {
            ListenerMode::EventDefined => self.signature.parameter_types(),
            ListenerMode::Void => Vec::new(),
            ListenerMode::Object => vec![argument_type.unwrap_or_else(ParamType::base_object)],
            ListenerMode::Int => vec![ParamType::of::<i32>()],
            ListenerMode::Float => vec![ParamType::of::<f32>()],
            ListenerMode::String => vec![ParamType::of::<String>()],
            ListenerMode::Bool => vec![ParamType::of::<bool>()],
        };
        self.runtime
            .find_method(target.value_type_id()?, name, &params)
    }

    /// Find the method a persistent record names.
    #[must_use]
    pub fn find_persistent_method(&self, call: &PersistentCall) -> Option<MethodHandle> {
        let argument_type = self
            .runtime
            .object_param_type(call.arguments().object_argument_type_name());
        self.find_method(
            call.method_name(),
            call.target(),
            call.mode(),
            Some(argument_type),
        )
    }
}

impl fmt::Debug for EventContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("runtime", self.runtime)
            .field("parameter_types", &self.signature.parameter_types())
            .finish()
    }
}
