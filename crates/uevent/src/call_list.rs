//! Two-tier listener list with a cached execution snapshot.

use core::any::Any;
use core::fmt;
use std::sync::Arc;

use crate::EventError;
use crate::invokable::Invokable;
use crate::object::ObjectRef;
use crate::reflect::MethodKey;

/// Persistent and runtime listener calls.
///
/// Calls run persistent tier first, then runtime tier, each in insertion
/// order. The merged order is cached and rebuilt lazily after any change.
pub struct InvokableCallList {
    persistent: Vec<Arc<dyn Invokable>>,
    runtime: Vec<Arc<dyn Invokable>>,
    executing: Vec<Arc<dyn Invokable>>,
    needs_update: bool,
}

impl Default for InvokableCallList {
    fn default() -> Self {
        Self::new()
    }
}

impl InvokableCallList {
    #[must_use]
    pub fn new() -> Self {
        Self {
            persistent: Vec::new(),
            runtime: Vec::new(),
            executing: Vec::new(),
            needs_update: true,
        }
    }

    /// Append to the persistent tier.
    pub fn add_persistent(&mut self, call: Arc<dyn Invokable>) {
        self.persistent.push(call);
        self.needs_update = true;
    }

    /// Append to the runtime tier.
    pub fn add_listener(&mut self, call: Arc<dyn Invokable>) {
        self.runtime.push(call);
        self.needs_update = true;
    }

    /// Remove every runtime call bound to `target` and `method`.
    ///
    /// The persistent tier is never touched. Returns the number removed.
    pub fn remove_listener(&mut self, target: Option<&ObjectRef>, method: MethodKey) -> usize {
        let before = self.runtime.len();
        self.runtime.retain(|call| !call.find(target, method));
        self.needs_update = true;
        before - self.runtime.len()
    }

    /// Empty the runtime tier.
    pub fn clear(&mut self) {
        self.runtime.clear();
        self.needs_update = true;
    }

    /// Empty the persistent tier.
    pub fn clear_persistent(&mut self) {
        self.persistent.clear();
        self.needs_update = true;
    }

    /// Number of calls in both tiers.
    #[must_use]
    pub fn count(&self) -> usize {
        self.persistent.len() + self.runtime.len()
    }

    #[must_use]
    pub fn persistent_count(&self) -> usize {
        self.persistent.len()
    }

    #[must_use]
    pub fn runtime_count(&self) -> usize {
        self.runtime.len()
    }

    /// Rebuild the snapshot if needed and return it.
    pub fn prepare(&mut self) -> &[Arc<dyn Invokable>] {
        if self.needs_update {
            self.executing.clear();
            self.executing.extend(self.persistent.iter().cloned());
            self.executing.extend(self.runtime.iter().cloned());
            self.needs_update = false;
        }
        &self.executing
    }

    /// Call every listener in snapshot order.
    ///
    /// The first error aborts the remaining calls of this pass.
    pub fn invoke(&mut self, args: &[&dyn Any]) -> Result<(), EventError> {
        for call in self.prepare() {
            call.invoke(args)?;
        }
        Ok(())
    }
}

impl fmt::Debug for InvokableCallList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokableCallList")
            .field("persistent", &self.persistent.len())
            .field("runtime", &self.runtime.len())
            .field("needs_update", &self.needs_update)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action1;
    use crate::invokable::InvokableCall;
    use parking_lot::Mutex;

    fn recording(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Arc<dyn Invokable> {
        let log = Arc::clone(log);
        Arc::new(InvokableCall::from_action(Action1::<i32>::new(move |_| {
            log.lock().push(tag);
        })))
    }

    #[test]
    fn test_persistent_fire_before_runtime() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InvokableCallList::new();

        list.add_listener(recording(&log, "R1"));
        list.add_persistent(recording(&log, "P1"));
        list.add_listener(recording(&log, "R2"));
        list.add_persistent(recording(&log, "P2"));

        let n = 0_i32;
        list.invoke(&[&n]).unwrap();
        assert_eq!(*log.lock(), vec!["P1", "P2", "R1", "R2"]);
        assert_eq!(list.count(), 4);
    }

    #[test]
    fn test_remove_listener_only_touches_runtime_tier() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = Arc::clone(&log);
        let action = Action1::<i32>::new(move |_| log_clone.lock().push("shared"));

        let mut list = InvokableCallList::new();
        list.add_persistent(Arc::new(InvokableCall::from_action(action.clone())));
        list.add_listener(Arc::new(InvokableCall::from_action(action.clone())));
        list.add_listener(Arc::new(InvokableCall::from_action(action.clone())));

        let removed = list.remove_listener(action.target(), action.method_key());
        assert_eq!(removed, 2);
        assert_eq!(list.persistent_count(), 1);
        assert_eq!(list.runtime_count(), 0);

        let n = 0_i32;
        list.invoke(&[&n]).unwrap();
        assert_eq!(*log.lock(), vec!["shared"]);
    }

    #[test]
    fn test_first_error_aborts_pass() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InvokableCallList::new();
        list.add_listener(recording(&log, "A"));
        list.add_listener(Arc::new(InvokableCall::from_action(Action1::<String>::new(|_| {}))));
        list.add_listener(recording(&log, "C"));

        let n = 0_i32;
        let err = list.invoke(&[&n]).unwrap_err();
        assert!(matches!(err, EventError::ArgumentType { index: 0, .. }));
        assert_eq!(*log.lock(), vec!["A"]);
    }

    #[test]
    fn test_empty_list_invokes_nothing() {
        let mut list = InvokableCallList::new();
        list.invoke(&[]).unwrap();
        assert!(list.prepare().is_empty());
    }

    #[test]
    fn test_snapshot_rebuilt_after_clear() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut list = InvokableCallList::new();
        list.add_listener(recording(&log, "R"));
        list.add_persistent(recording(&log, "P"));
        assert_eq!(list.prepare().len(), 2);

        list.clear();
        assert_eq!(list.prepare().len(), 1);
        list.clear_persistent();
        assert!(list.prepare().is_empty());
    }
}
