//! A single serialized listener record.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::EventError;
use crate::argument::{ArgumentCache, deserialize_tidy, serialize_tidy, tidy_type_name};
use crate::event::EventContext;
use crate::invokable::{CachedInvokableCall, Invokable, InvokableCall};
use crate::object::{ObjectRef, Objects};
use crate::persistent::{CallState, ListenerMode};
use crate::reflect::MethodHandle;

/// A persistent listener: target, method name, mode and cached argument.
///
/// Records are plain data. They turn into callable bindings through
/// [`runtime_call`](Self::runtime_call), which the owning event runs lazily
/// before the next invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistentCall {
    #[serde(rename = "m_Target")]
    target: ObjectRef,
    #[serde(
        rename = "m_TargetAssemblyTypeName",
        serialize_with = "serialize_tidy",
        deserialize_with = "deserialize_tidy"
    )]
    target_type_name: String,
    #[serde(rename = "m_MethodName")]
    method_name: String,
    #[serde(rename = "m_Mode")]
    mode: ListenerMode,
    #[serde(rename = "m_Arguments")]
    arguments: ArgumentCache,
    #[serde(rename = "m_CallState")]
    call_state: CallState,
}

impl PersistentCall {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn target(&self) -> &ObjectRef {
        &self.target
    }

    /// Qualified type of the target at registration time.
    #[must_use]
    pub fn target_type_name(&self) -> &str {
        &self.target_type_name
    }

    #[must_use]
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    #[must_use]
    pub fn mode(&self) -> ListenerMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ListenerMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn arguments(&self) -> &ArgumentCache {
        &self.arguments
    }

    pub fn arguments_mut(&mut self) -> &mut ArgumentCache {
        &mut self.arguments
    }

    #[must_use]
    pub fn call_state(&self) -> CallState {
        self.call_state
    }

    pub fn set_call_state(&mut self, state: CallState) {
        self.call_state = state;
    }

    /// A record is valid when it names both a target and a method.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !self.target.is_null() && !self.method_name.is_empty()
    }

    /// Point the record at `method_name` on `target`.
    pub fn register(&mut self, target: ObjectRef, method_name: impl Into<String>) {
        self.target_type_name = target
            .upgrade()
            .map(|instance| tidy_type_name(instance.qualified_type_name()))
            .unwrap_or_default();
        self.target = target;
        self.method_name = method_name.into();
    }

    /// Clear target and method name, keeping mode, arguments and state.
    pub fn unregister(&mut self) {
        self.target = ObjectRef::null();
        self.target_type_name.clear();
        self.method_name.clear();
    }

    /// Resolve the record into a callable binding.
    ///
    /// Returns `None`, without error, if the record is switched off, is
    /// runtime-only while the runtime is not playing, has no event context,
    /// or names a method that cannot be found.
    #[must_use]
    pub fn runtime_call(&self, ctx: Option<&EventContext<'_>>) -> Option<Arc<dyn Invokable>> {
        if self.call_state == CallState::Off {
            return None;
        }
        let ctx = ctx?;
        if self.call_state == CallState::RuntimeOnly && !ctx.runtime().is_playing() {
            return None;
        }

        let Some(method) = ctx.find_persistent_method(self) else {
            trace!(
                "No method {} on {} for mode {:?}",
                self.method_name, self.target, self.mode
            );
            return None;
        };

        let call = match self.mode {
            ListenerMode::EventDefined => ctx.signature().delegate(&self.target, &method),
            ListenerMode::Void => InvokableCall::<()>::new(&self.target, Some(&method))
                .map(|call| Arc::new(call) as Arc<dyn Invokable>),
            ListenerMode::Object => self.object_call(ctx, &method),
            ListenerMode::Int => self.cached_call(&method, self.arguments.int_argument()),
            ListenerMode::Float => self.cached_call(&method, self.arguments.float_argument()),
            ListenerMode::String => {
                self.cached_call(&method, self.arguments.string_argument().to_owned())
            }
            ListenerMode::Bool => self.cached_call(&method, self.arguments.bool_argument()),
        };

        match call {
            Ok(call) => Some(call),
            Err(error) => {
                trace!("Could not bind {}: {}", method, error);
                None
            }
        }
    }

    fn cached_call<T: Clone + Send + Sync + 'static>(
        &self,
        method: &MethodHandle,
        argument: T,
    ) -> Result<Arc<dyn Invokable>, EventError> {
        let call = CachedInvokableCall::new(&self.target, Some(method), argument)?;
        Ok(Arc::new(call))
    }

    /// Object mode: the parameter type comes from the stored type identifier,
    /// and an argument that does not fit it is passed as null.
    fn object_call(
        &self,
        ctx: &EventContext<'_>,
        method: &MethodHandle,
    ) -> Result<Arc<dyn Invokable>, EventError> {
        let runtime = ctx.runtime();
        let param = runtime.object_param_type(self.arguments.object_argument_type_name());

        let mut argument = self.arguments.object_argument().clone();
        if !runtime.is_assignable(&argument, &param) {
            argument = ObjectRef::null();
        }

        let call =
            CachedInvokableCall::new(&self.target, Some(method), argument)?.with_param_type(param);
        Ok(Arc::new(call))
    }

    pub(crate) fn relink(&mut self, objects: &Objects) {
        objects.relink(&mut self.target);
        self.arguments.relink(objects);
    }
}
