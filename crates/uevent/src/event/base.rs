//! The arity-independent core every event is built on.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::EventError;
use crate::action::Action;
use crate::args::ArgList;
use crate::call_list::InvokableCallList;
use crate::event::{EventContext, EventSignature, Signature};
use crate::invokable::Invokable;
use crate::object::{ObjectRef, Objects};
use crate::persistent::{
    CallState, ListenerMode, ListenerStatus, PersistentCall, PersistentCallGroup,
};
use crate::reflect::{MethodHandle, MethodKey, ParamType};
use crate::runtime::Runtime;

/// Persistent listener records plus the live call list they resolve into.
///
/// The persistent tier of the call list is rebuilt from the records before
/// the first invocation after any change to them, after deserialization and
/// after the runtime is replaced.
#[derive(Serialize, Deserialize)]
pub struct EventBase {
    #[serde(skip)]
    calls: InvokableCallList,
    #[serde(rename = "m_PersistentCalls", default)]
    persistent_calls: PersistentCallGroup,
    #[serde(rename = "m_TypeName", default)]
    type_name: String,
    #[serde(skip, default = "dirty")]
    calls_dirty: bool,
    #[serde(skip, default = "Runtime::global")]
    runtime: Arc<Runtime>,
    #[serde(skip, default = "void_signature")]
    signature: Arc<dyn EventSignature>,
}

const fn dirty() -> bool {
    true
}

fn void_signature() -> Arc<dyn EventSignature> {
    Arc::new(Signature::<()>::new())
}

impl Default for EventBase {
    fn default() -> Self {
        Self::new(void_signature(), Runtime::global())
    }
}

impl EventBase {
    /// Create an event core for `signature`, resolving against `runtime`.
    #[must_use]
    pub fn new(signature: Arc<dyn EventSignature>, runtime: Arc<Runtime>) -> Self {
        Self {
            calls: InvokableCallList::new(),
            persistent_calls: PersistentCallGroup::new(),
            type_name: signature.event_type_name(),
            calls_dirty: true,
            runtime,
            signature,
        }
    }

    pub(crate) fn set_signature(&mut self, signature: Arc<dyn EventSignature>) {
        self.type_name = signature.event_type_name();
        self.signature = signature;
        self.dirty_persistent_calls();
    }

    #[must_use]
    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    /// Resolve against another runtime from now on.
    pub fn set_runtime(&mut self, runtime: Arc<Runtime>) {
        self.runtime = runtime;
        self.dirty_persistent_calls();
    }

    /// Qualified type identifier of the concrete event.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn parameter_types(&self) -> Vec<ParamType> {
        self.signature.parameter_types()
    }

    #[must_use]
    pub fn persistent_calls(&self) -> &PersistentCallGroup {
        &self.persistent_calls
    }

    fn context(&self) -> EventContext<'_> {
        EventContext::new(&self.runtime, self.signature.as_ref())
    }

    // Introspection

    #[must_use]
    pub fn persistent_event_count(&self) -> usize {
        self.persistent_calls.count()
    }

    #[must_use]
    pub fn persistent_target(&self, index: usize) -> Option<&ObjectRef> {
        self.persistent_calls.get_listener(index).map(PersistentCall::target)
    }

    #[must_use]
    pub fn persistent_method_name(&self, index: usize) -> Option<&str> {
        self.persistent_calls
            .get_listener(index)
            .map(PersistentCall::method_name)
    }

    #[must_use]
    pub fn persistent_listener_state(&self, index: usize) -> Option<CallState> {
        self.persistent_calls
            .get_listener(index)
            .map(PersistentCall::call_state)
    }

    pub fn set_persistent_listener_state(
        &mut self,
        index: usize,
        state: CallState,
    ) -> Result<(), EventError> {
        let count = self.persistent_calls.count();
        let listener = self
            .persistent_calls
            .get_listener_mut(index)
            .ok_or(EventError::IndexOutOfRange { index, count })?;
        listener.set_call_state(state);
        self.dirty_persistent_calls();
        Ok(())
    }

    /// Why the record at `index` does or does not resolve.
    #[must_use]
    pub fn listener_status(&self, index: usize) -> Option<ListenerStatus> {
        let call = self.persistent_calls.get_listener(index)?;
        let status = if call.method_name().is_empty() {
            ListenerStatus::Empty
        } else if !call.target().is_alive() {
            ListenerStatus::MissingTarget
        } else if self.find_persistent_method(call).is_none() {
            ListenerStatus::MissingMethod
        } else {
            ListenerStatus::Valid
        };
        Some(status)
    }

    /// Whether the record at `index` names a live target and a resolvable
    /// method.
    #[must_use]
    pub fn is_persistent_listener_valid(&self, index: usize) -> bool {
        self.listener_status(index)
            .is_some_and(ListenerStatus::is_valid)
    }

    // Method resolution

    /// Find `name` on `target` as a listener of the given mode.
    #[must_use]
    pub fn find_method(
        &self,
        name: &str,
        target: &ObjectRef,
        mode: ListenerMode,
        argument_type: Option<ParamType>,
    ) -> Option<MethodHandle> {
        self.context().find_method(name, target, mode, argument_type)
    }

    /// Find the method a persistent record names.
    #[must_use]
    pub fn find_persistent_method(&self, call: &PersistentCall) -> Option<MethodHandle> {
        self.context().find_persistent_method(call)
    }

    // Persistent listener editing

    /// Append an empty record; fill it with one of the `register_*` calls.
    pub fn add_persistent_listener(&mut self) {
        self.persistent_calls.add_listener();
    }

    /// Delete the record at `index`.
    pub fn remove_persistent_listener(
        &mut self,
        index: usize,
    ) -> Result<PersistentCall, EventError> {
        let removed = self.persistent_calls.remove_listener(index)?;
        self.dirty_persistent_calls();
        Ok(removed)
    }

    /// Delete every record naming `target` and `method_name`.
    ///
    /// Null targets and empty names are ignored.
    pub fn remove_persistent_listeners(&mut self, target: &ObjectRef, method_name: &str) -> usize {
        if target.is_null() || method_name.is_empty() {
            return 0;
        }
        let removed = self.persistent_calls.remove_listeners(target, method_name);
        self.dirty_persistent_calls();
        removed
    }

    /// Clear target and method of the record at `index`.
    pub fn unregister_persistent_listener(&mut self, index: usize) -> Result<(), EventError> {
        self.persistent_calls.unregister_persistent_listener(index)?;
        self.dirty_persistent_calls();
        Ok(())
    }

    /// Check a registration before any record is touched.
    ///
    /// An out-of-range `index` fails before the method is looked up. Returns
    /// `Ok(false)` with a warning if the method cannot be resolved.
    fn validate_registration(
        &self,
        index: usize,
        target: Option<&ObjectRef>,
        method_name: Option<&str>,
        mode: ListenerMode,
        argument_type: Option<ParamType>,
    ) -> Result<bool, EventError> {
        let count = self.persistent_calls.count();
        if index >= count {
            return Err(EventError::IndexOutOfRange { index, count });
        }
        let Some(target) = target else {
            return Err(EventError::StaticListener(
                method_name.unwrap_or("<closure>").to_owned(),
            ));
        };
        let method_name = method_name.ok_or(EventError::NullArgument("method"))?;
        if !target.is_alive() {
            return Err(EventError::InvalidTarget {
                method: method_name.to_owned(),
                target: target.to_string(),
            });
        }

        if self
            .find_method(method_name, target, mode, argument_type)
            .is_some()
        {
            return Ok(true);
        }
        warn!(
            "Could not register listener {}.{} on {}: the method could not be found",
            target, method_name, self.type_name
        );
        Ok(false)
    }

    fn validate_action<Args>(
        &self,
        index: usize,
        call: &Action<Args>,
        mode: ListenerMode,
        argument_type: Option<ParamType>,
    ) -> Result<Option<(ObjectRef, &'static str)>, EventError>
    where
        Args: ArgList,
    {
        if !self.validate_registration(
            index,
            call.target(),
            call.method_name(),
            mode,
            argument_type,
        )? {
            return Ok(None);
        }
        // Validation guarantees both are present.
        Ok(call.target().cloned().zip(call.method_name()))
    }

    /// Point the record at `index` at `method_name` on `target`, receiving
    /// the event's own arguments.
    pub fn register_event_persistent_listener(
        &mut self,
        index: usize,
        target: &ObjectRef,
        method_name: &str,
    ) -> Result<bool, EventError> {
        if !self.validate_registration(
            index,
            Some(target),
            Some(method_name),
            ListenerMode::EventDefined,
            None,
        )? {
            return Ok(false);
        }
        self.persistent_calls
            .register_event_persistent_listener(index, target.clone(), method_name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    pub fn register_void_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<()>,
    ) -> Result<bool, EventError> {
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::Void, None)?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_void_persistent_listener(index, target, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    /// Register an object listener with a fixed argument.
    ///
    /// The method is looked up with the argument's registered type, or the
    /// base object type if the argument is null.
    pub fn register_object_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<(ObjectRef,)>,
        argument: ObjectRef,
    ) -> Result<bool, EventError> {
        let argument_type = self.runtime.param_type_of(&argument);
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::Object, Some(argument_type))?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_object_persistent_listener(index, target, argument, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    pub fn register_int_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<(i32,)>,
        argument: i32,
    ) -> Result<bool, EventError> {
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::Int, None)?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_int_persistent_listener(index, target, argument, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    pub fn register_float_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<(f32,)>,
        argument: f32,
    ) -> Result<bool, EventError> {
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::Float, None)?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_float_persistent_listener(index, target, argument, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    pub fn register_string_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<(String,)>,
        argument: &str,
    ) -> Result<bool, EventError> {
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::String, None)?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_string_persistent_listener(index, target, argument, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    pub fn register_bool_persistent_listener(
        &mut self,
        index: usize,
        call: &Action<(bool,)>,
        argument: bool,
    ) -> Result<bool, EventError> {
        let Some((target, name)) =
            self.validate_action(index, call, ListenerMode::Bool, None)?
        else {
            return Ok(false);
        };
        self.persistent_calls
            .register_bool_persistent_listener(index, target, argument, name)?;
        self.dirty_persistent_calls();
        Ok(true)
    }

    // Append-and-register shorthands. A record that fails to register stays
    // in place, empty.

    pub fn add_void_persistent_listener(&mut self, call: &Action<()>) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_void_persistent_listener(index, call)
    }

    pub fn add_object_persistent_listener(
        &mut self,
        call: &Action<(ObjectRef,)>,
        argument: ObjectRef,
    ) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_object_persistent_listener(index, call, argument)
    }

    pub fn add_int_persistent_listener(
        &mut self,
        call: &Action<(i32,)>,
        argument: i32,
    ) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_int_persistent_listener(index, call, argument)
    }

    pub fn add_float_persistent_listener(
        &mut self,
        call: &Action<(f32,)>,
        argument: f32,
    ) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_float_persistent_listener(index, call, argument)
    }

    pub fn add_string_persistent_listener(
        &mut self,
        call: &Action<(String,)>,
        argument: &str,
    ) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_string_persistent_listener(index, call, argument)
    }

    pub fn add_bool_persistent_listener(
        &mut self,
        call: &Action<(bool,)>,
        argument: bool,
    ) -> Result<bool, EventError> {
        let index = self.persistent_event_count();
        self.add_persistent_listener();
        self.register_bool_persistent_listener(index, call, argument)
    }

    // Runtime listeners

    /// Append a call to the runtime tier.
    pub fn add_call(&mut self, call: Arc<dyn Invokable>) {
        self.calls.add_listener(call);
    }

    /// Remove runtime calls bound to `target` and `method`.
    pub fn remove_call(&mut self, target: Option<&ObjectRef>, method: MethodKey) -> usize {
        self.calls.remove_listener(target, method)
    }

    /// Remove every runtime listener. Persistent listeners stay.
    pub fn remove_all_listeners(&mut self) {
        self.calls.clear();
    }

    // Invocation

    /// Drop the resolved persistent calls and re-resolve before the next
    /// invocation.
    pub fn dirty_persistent_calls(&mut self) {
        self.calls.clear_persistent();
        self.calls_dirty = true;
    }

    fn rebuild_persistent_calls_if_needed(&mut self) {
        if !self.calls_dirty {
            return;
        }
        self.calls.clear_persistent();
        let ctx = EventContext::new(&self.runtime, self.signature.as_ref());
        let resolved = self.persistent_calls.initialize(&mut self.calls, Some(&ctx));
        debug!(
            "Rebuilt persistent calls of {}: {} of {} records resolved",
            self.type_name,
            resolved,
            self.persistent_calls.count()
        );
        self.calls_dirty = false;
    }

    /// Resolve if needed and return the calls the next invocation runs.
    pub fn prepare_invoke(&mut self) -> &[Arc<dyn Invokable>] {
        self.rebuild_persistent_calls_if_needed();
        self.calls.prepare()
    }

    /// Invoke every listener with an erased argument buffer.
    pub fn invoke_erased(&mut self, args: &[&dyn Any]) -> Result<(), EventError> {
        self.rebuild_persistent_calls_if_needed();
        self.calls.invoke(args)
    }

    /// Finish loading: relink references and force re-resolution.
    pub fn on_after_deserialize(&mut self, objects: &Objects) {
        self.persistent_calls.relink(objects);
        self.type_name = self.signature.event_type_name();
        self.dirty_persistent_calls();
    }
}

impl fmt::Debug for EventBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBase")
            .field("type_name", &self.type_name)
            .field("persistent_calls", &self.persistent_calls.count())
            .field("calls", &self.calls)
            .field("calls_dirty", &self.calls_dirty)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for EventBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name)
    }
}
