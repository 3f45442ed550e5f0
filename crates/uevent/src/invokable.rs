//! Resolved, type-erased listener calls.

use core::any::Any;
use core::fmt;

use tracing::trace;

use crate::EventError;
use crate::action::Action;
use crate::args::ArgList;
use crate::object::ObjectRef;
use crate::reflect::{MethodHandle, MethodKey, ParamType};

/// A listener call behind a uniform, arity-erased interface.
pub trait Invokable: Send + Sync {
    /// Call with an erased argument buffer.
    ///
    /// Implementations check the buffer against their signature first and
    /// silently skip the call if their target has been destroyed.
    fn invoke(&self, args: &[&dyn Any]) -> Result<(), EventError>;

    /// Whether this call is bound to `target` and `method`.
    fn find(&self, target: Option<&ObjectRef>, method: MethodKey) -> bool;

    /// Parameter types the call expects.
    fn signature(&self) -> Vec<ParamType>;
}

/// A call taking the arguments `Args`.
pub struct InvokableCall<Args> {
    action: Action<Args>,
}

impl<Args: ArgList> InvokableCall<Args> {
    /// Bind `method` to `target`.
    pub fn new(target: &ObjectRef, method: Option<&MethodHandle>) -> Result<Self, EventError> {
        if target.is_null() {
            return Err(EventError::NullArgument("target"));
        }
        let method = method.ok_or(EventError::NullArgument("function"))?;
        Ok(Self {
            action: Action::from_method(target, method)?,
        })
    }

    /// Wrap a prebuilt delegate.
    #[must_use]
    pub fn from_action(action: Action<Args>) -> Self {
        Self { action }
    }

    #[must_use]
    pub fn action(&self) -> &Action<Args> {
        &self.action
    }

    /// Liveness check made right before each call.
    fn allow_invoke(&self) -> bool {
        self.action.target().is_none_or(ObjectRef::is_alive)
    }

    fn call(&self, args: Args) -> Result<(), EventError> {
        if !self.allow_invoke() {
            trace!(
                "Skipping {:?}: target {:?} is no longer alive",
                self.action.method_name(),
                self.action.target()
            );
            return Ok(());
        }
        self.action.call(args)
    }
}

impl<Args: ArgList> Invokable for InvokableCall<Args> {
    /// Zero-parameter calls ignore the buffer, so a `Void` listener can sit
    /// on an event of any arity.
    fn invoke(&self, args: &[&dyn Any]) -> Result<(), EventError> {
        let args = if Args::ARITY == 0 {
            Args::from_args(&[])?
        } else {
            Args::from_args(args)?
        };
        self.call(args)
    }

    fn find(&self, target: Option<&ObjectRef>, method: MethodKey) -> bool {
        self.action.target() == target && self.action.method_key() == method
    }

    fn signature(&self) -> Vec<ParamType> {
        Args::param_types()
    }
}

impl<Args> fmt::Debug for InvokableCall<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvokableCall")
            .field("action", &self.action)
            .finish()
    }
}

/// A one-parameter call that always receives the same literal.
///
/// Whatever is passed to [`invoke`](Invokable::invoke) is ignored.
pub struct CachedInvokableCall<T> {
    call: InvokableCall<(T,)>,
    argument: T,
    param: ParamType,
}

impl<T: Clone + Send + Sync + 'static> CachedInvokableCall<T> {
    pub fn new(
        target: &ObjectRef,
        method: Option<&MethodHandle>,
        argument: T,
    ) -> Result<Self, EventError> {
        Ok(Self {
            call: InvokableCall::new(target, method)?,
            argument,
            param: ParamType::of::<T>(),
        })
    }

    /// Report `param` as the parameter type instead of `T`'s own.
    ///
    /// Object calls store an [`ObjectRef`] but were resolved against a
    /// concrete host object type.
    #[must_use]
    pub fn with_param_type(mut self, param: ParamType) -> Self {
        self.param = param;
        self
    }

    #[must_use]
    pub fn argument(&self) -> &T {
        &self.argument
    }
}

impl<T: Clone + Send + Sync + 'static> Invokable for CachedInvokableCall<T> {
    fn invoke(&self, _args: &[&dyn Any]) -> Result<(), EventError> {
        self.call.call((self.argument.clone(),))
    }

    fn find(&self, target: Option<&ObjectRef>, method: MethodKey) -> bool {
        self.call.find(target, method)
    }

    fn signature(&self) -> Vec<ParamType> {
        vec![self.param]
    }
}

impl<T: fmt::Debug> fmt::Debug for CachedInvokableCall<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedInvokableCall")
            .field("call", &self.call)
            .field("argument", &self.argument)
            .field("param", &self.param)
            .finish()
    }
}
