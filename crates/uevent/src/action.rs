//! Runtime delegates.

use core::fmt;
use std::sync::Arc;

use crate::EventError;
use crate::args::ArgList;
use crate::object::{Handle, ObjectRef};
use crate::reflect::{MethodHandle, MethodKey, ObjectType};

type Delegate<Args> = dyn Fn(Args) -> Result<(), EventError> + Send + Sync;

/// A callable taking `Args`, optionally bound to a host object.
///
/// Actions come in three shapes:
///
/// - [`Action::new`]: a free closure with no target. Such actions can be
///   added as runtime listeners but never persisted.
/// - [`Action::bound`]: a closure over a host object. It has a target but no
///   method name, so it cannot be persisted either.
/// - [`Action::from_method`] (or [`Runtime::action`](crate::Runtime::action)):
///   a registered method on a host object. Only these can be registered as
///   persistent listeners.
///
/// Every action carries a [`MethodKey`]; two actions are the same listener
/// when their target and key match, which is what `remove_listener` uses.
pub struct Action<Args> {
    target: Option<ObjectRef>,
    method: MethodKey,
    name: Option<&'static str>,
    delegate: Arc<Delegate<Args>>,
}

impl<Args> Clone for Action<Args> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            method: self.method,
            name: self.name,
            delegate: Arc::clone(&self.delegate),
        }
    }
}

impl<Args: ArgList> Action<Args> {
    /// Wrap a fallible closure with no target.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(Args) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self {
            target: None,
            method: MethodKey::next(),
            name: None,
            delegate: Arc::new(f),
        }
    }

    /// Wrap a fallible closure acting on `target`.
    pub fn bound_fn<F>(target: ObjectRef, f: F) -> Self
    where
        F: Fn(Args) -> Result<(), EventError> + Send + Sync + 'static,
    {
        Self {
            target: Some(target),
            ..Self::from_fn(f)
        }
    }

    /// Bind a registered method to `target`.
    ///
    /// Fails with [`EventError::SignatureMismatch`] if the method does not
    /// take exactly `Args::ARITY` parameters, and with
    /// [`EventError::ParameterMismatch`] if a parameter type differs. Object
    /// references pass to any object parameter; their concrete type is
    /// checked when they are resolved.
    pub fn from_method(target: &ObjectRef, method: &MethodHandle) -> Result<Self, EventError> {
        if method.arity() != Args::ARITY {
            return Err(EventError::SignatureMismatch {
                method: method.name(),
                expected: Args::ARITY,
                actual: method.arity(),
            });
        }
        let params = Args::param_types();
        for (index, (passed, declared)) in params.iter().zip(method.params()).enumerate() {
            let fits = passed.type_id() == declared.type_id()
                || (passed.is_object() && declared.is_object());
            if !fits {
                return Err(EventError::ParameterMismatch {
                    method: method.name(),
                    index,
                    declared: declared.name(),
                    passed: passed.name(),
                });
            }
        }

        let handle = method.clone();
        let weak = target.clone();
        Ok(Self {
            target: Some(target.clone()),
            method: method.key(),
            name: Some(method.name()),
            delegate: Arc::new(move |args: Args| {
                let Some(instance) = weak.get() else {
                    return Ok(());
                };
                handle.invoke(instance.value(), &args.to_args())
            }),
        })
    }

    /// The bound object, `None` for free closures.
    #[must_use]
    pub fn target(&self) -> Option<&ObjectRef> {
        self.target.as_ref()
    }

    #[must_use]
    pub fn method_key(&self) -> MethodKey {
        self.method
    }

    /// Name of the registered method, `None` for closures.
    #[must_use]
    pub fn method_name(&self) -> Option<&'static str> {
        self.name
    }

    /// Whether the action has no target.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.target.is_none()
    }

    pub fn call(&self, args: Args) -> Result<(), EventError> {
        (self.delegate)(args)
    }
}

macro_rules! impl_action_arity {
    ($($ty:ident $var:ident),*) => {
        impl<$($ty: Clone + 'static),*> Action<($($ty,)*)> {
            /// Wrap a closure with no target.
            pub fn new<F>(f: F) -> Self
            where
                F: Fn($($ty),*) + Send + Sync + 'static,
            {
                Self::from_fn(move |($($var,)*)| {
                    f($($var),*);
                    Ok(())
                })
            }

            /// Wrap a closure over a host object.
            ///
            /// The closure is skipped once the object is destroyed.
            pub fn bound<T, F>(handle: &Handle<T>, f: F) -> Self
            where
                T: ObjectType,
                F: Fn(&T, $($ty),*) + Send + Sync + 'static,
            {
                let target = ObjectRef::new(handle);
                let weak = target.clone();
                Self::bound_fn(target, move |($($var,)*)| {
                    let _ = weak.with(|value: &T| f(value, $($var),*));
                    Ok(())
                })
            }
        }
    };
}

impl_action_arity!();
impl_action_arity!(A a);
impl_action_arity!(A a, B b);
impl_action_arity!(A a, B b, C c);
impl_action_arity!(A a, B b, C c, D d);

/// Zero-argument action.
pub type Action0 = Action<()>;
/// One-argument action.
pub type Action1<A> = Action<(A,)>;
/// Two-argument action.
pub type Action2<A, B> = Action<(A, B)>;
/// Three-argument action.
pub type Action3<A, B, C> = Action<(A, B, C)>;
/// Four-argument action.
pub type Action4<A, B, C, D> = Action<(A, B, C, D)>;

impl<Args> fmt::Debug for Action<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("target", &self.target)
            .field("method", &self.method)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
