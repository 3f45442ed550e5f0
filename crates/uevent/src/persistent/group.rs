//! Ordered collection of persistent listener records.

use serde::{Deserialize, Serialize};

use crate::EventError;
use crate::call_list::InvokableCallList;
use crate::event::EventContext;
use crate::object::{ObjectRef, Objects};
use crate::persistent::{ListenerMode, PersistentCall};

/// Persistent listener records in invocation order.
///
/// Duplicates are allowed and fire independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentCallGroup {
    #[serde(rename = "m_Calls", default)]
    calls: Vec<PersistentCall>,
}

impl PersistentCallGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.len()
    }

    #[must_use]
    pub fn get_listener(&self, index: usize) -> Option<&PersistentCall> {
        self.calls.get(index)
    }

    pub fn get_listener_mut(&mut self, index: usize) -> Option<&mut PersistentCall> {
        self.calls.get_mut(index)
    }

    pub fn listeners(&self) -> impl Iterator<Item = &PersistentCall> {
        self.calls.iter()
    }

    fn listener_mut(&mut self, index: usize) -> Result<&mut PersistentCall, EventError> {
        let count = self.calls.len();
        self.calls
            .get_mut(index)
            .ok_or(EventError::IndexOutOfRange { index, count })
    }

    /// Append an empty record.
    pub fn add_listener(&mut self) {
        self.calls.push(PersistentCall::new());
    }

    /// Append an existing record.
    pub fn add_listener_call(&mut self, call: PersistentCall) {
        self.calls.push(call);
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Delete the record at `index`.
    pub fn remove_listener(&mut self, index: usize) -> Result<PersistentCall, EventError> {
        if index >= self.calls.len() {
            return Err(EventError::IndexOutOfRange {
                index,
                count: self.calls.len(),
            });
        }
        Ok(self.calls.remove(index))
    }

    /// Delete every record naming exactly `target` and `method_name`.
    ///
    /// Returns the number of records removed.
    pub fn remove_listeners(&mut self, target: &ObjectRef, method_name: &str) -> usize {
        let before = self.calls.len();
        self.calls
            .retain(|call| !(call.target() == target && call.method_name() == method_name));
        before - self.calls.len()
    }

    fn register(
        &mut self,
        index: usize,
        target: ObjectRef,
        method_name: &str,
        mode: ListenerMode,
    ) -> Result<&mut PersistentCall, EventError> {
        let listener = self.listener_mut(index)?;
        listener.register(target, method_name);
        listener.set_mode(mode);
        Ok(listener)
    }

    pub fn register_event_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::EventDefined)?;
        Ok(())
    }

    pub fn register_void_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::Void)?;
        Ok(())
    }

    pub fn register_object_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        argument: ObjectRef,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::Object)?
            .arguments_mut()
            .set_object_argument(argument);
        Ok(())
    }

    pub fn register_int_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        argument: i32,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::Int)?
            .arguments_mut()
            .set_int_argument(argument);
        Ok(())
    }

    pub fn register_float_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        argument: f32,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::Float)?
            .arguments_mut()
            .set_float_argument(argument);
        Ok(())
    }

    pub fn register_string_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        argument: &str,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::String)?
            .arguments_mut()
            .set_string_argument(argument);
        Ok(())
    }

    pub fn register_bool_persistent_listener(
        &mut self,
        index: usize,
        target: ObjectRef,
        argument: bool,
        method_name: &str,
    ) -> Result<(), EventError> {
        self.register(index, target, method_name, ListenerMode::Bool)?
            .arguments_mut()
            .set_bool_argument(argument);
        Ok(())
    }

    /// Clear target and method of the record at `index`.
    pub fn unregister_persistent_listener(&mut self, index: usize) -> Result<(), EventError> {
        self.listener_mut(index)?.unregister();
        Ok(())
    }

    /// Resolve every valid record into the persistent tier of `list`.
    ///
    /// Records that resolve to nothing are skipped. Returns the number of
    /// calls added.
    pub fn initialize(&self, list: &mut InvokableCallList, ctx: Option<&EventContext<'_>>) -> usize {
        let mut added = 0;
        for call in self.calls.iter().filter(|call| call.is_valid()) {
            if let Some(runtime_call) = call.runtime_call(ctx) {
                list.add_persistent(runtime_call);
                added += 1;
            }
        }
        added
    }

    /// Rebind every deserialized reference to the live objects.
    pub fn relink(&mut self, objects: &Objects) {
        for call in &mut self.calls {
            call.relink(objects);
        }
    }
}
