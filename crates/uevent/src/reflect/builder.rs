//! Builder for per-type method tables.

use core::any::{Any, TypeId};
use core::marker::PhantomData;
use std::sync::Arc;

use crate::args::ArgList;
use crate::object::{AnyObject, ObjectRef};
use crate::reflect::{MethodHandle, ObjectType, ParamType};
use crate::EventError;

/// Collects the callable methods of `T`.
///
/// Methods are grouped in levels: level 0 holds the methods `T` declares
/// itself, and each [`inherit`](Self::inherit) appends the levels of an
/// ancestor. Lookups walk the levels in order, so a method declared on `T`
/// shadows an ancestor method with the same signature.
pub struct TypeBuilder<T> {
    pub(crate) levels: Vec<Vec<MethodHandle>>,
    pub(crate) ancestors: Vec<TypeId>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ObjectType> Default for TypeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ObjectType> TypeBuilder<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            levels: vec![Vec::new()],
            ancestors: Vec::new(),
            _marker: PhantomData,
        }
    }

    fn push<F>(&mut self, name: &'static str, params: Vec<ParamType>, body: F) -> &mut Self
    where
        F: Fn(&T, &[&dyn Any]) -> Result<(), EventError> + Send + Sync + 'static,
    {
        let call = Arc::new(move |target: &AnyObject, args: &[&dyn Any]| {
            let target = target
                .downcast_ref::<T>()
                .ok_or(EventError::TargetType(T::type_name()))?;
            body(target, args)
        });
        self.levels[0].push(MethodHandle::new(name, T::type_name(), params, call));
        self
    }

    /// Register a method with no parameters.
    pub fn method0<F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.push(name, <()>::param_types(), move |target, args| {
            <()>::from_args(args)?;
            f(target);
            Ok(())
        })
    }

    /// Register a method with one parameter.
    pub fn method1<A, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        A: Clone + 'static,
        F: Fn(&T, A) + Send + Sync + 'static,
    {
        self.push(name, <(A,)>::param_types(), move |target, args| {
            let (a,) = <(A,)>::from_args(args)?;
            f(target, a);
            Ok(())
        })
    }

    /// Register a method with two parameters.
    pub fn method2<A, B, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        F: Fn(&T, A, B) + Send + Sync + 'static,
    {
        self.push(name, <(A, B)>::param_types(), move |target, args| {
            let (a, b) = <(A, B)>::from_args(args)?;
            f(target, a, b);
            Ok(())
        })
    }

    /// Register a method with three parameters.
    pub fn method3<A, B, C, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
        F: Fn(&T, A, B, C) + Send + Sync + 'static,
    {
        self.push(name, <(A, B, C)>::param_types(), move |target, args| {
            let (a, b, c) = <(A, B, C)>::from_args(args)?;
            f(target, a, b, c);
            Ok(())
        })
    }

    /// Register a method with four parameters.
    pub fn method4<A, B, C, D, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        A: Clone + 'static,
        B: Clone + 'static,
        C: Clone + 'static,
        D: Clone + 'static,
        F: Fn(&T, A, B, C, D) + Send + Sync + 'static,
    {
        self.push(name, <(A, B, C, D)>::param_types(), move |target, args| {
            let (a, b, c, d) = <(A, B, C, D)>::from_args(args)?;
            f(target, a, b, c, d);
            Ok(())
        })
    }

    /// Register a method taking a reference to a host object of type `L`.
    ///
    /// The method receives `None` if the argument is null or destroyed, and
    /// also for subtypes of `L`: use [`object_ref_method`](Self::object_ref_method)
    /// to accept those.
    pub fn object_method<L, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        L: ObjectType,
        F: Fn(&T, Option<&L>) + Send + Sync + 'static,
    {
        self.object_ref_method::<L, _>(name, move |target, argument| {
            let instance = argument.get();
            let value = instance
                .as_deref()
                .and_then(|instance| instance.value().downcast_ref::<L>());
            f(target, value);
        })
    }

    /// Register a method declared to take an `L`, receiving the raw reference.
    pub fn object_ref_method<L, F>(&mut self, name: &'static str, f: F) -> &mut Self
    where
        L: ObjectType,
        F: Fn(&T, &ObjectRef) + Send + Sync + 'static,
    {
        self.push(name, vec![ParamType::object_of::<L>()], move |target, args| {
            let (argument,) = <(ObjectRef,)>::from_args(args)?;
            f(target, &argument);
            Ok(())
        })
    }

    /// Expose the methods of an ancestor `B` reachable through `project`.
    ///
    /// The ancestor's own levels are appended after everything registered
    /// so far, so call this after registering `T`'s own methods if in
    /// doubt; shadowing only depends on level order, not call order.
    pub fn inherit<B: ObjectType>(&mut self, project: fn(&T) -> &B) -> &mut Self {
        let mut base = TypeBuilder::<B>::new();
        B::describe(&mut base);

        self.ancestors.push(TypeId::of::<B>());
        self.ancestors.extend(base.ancestors);

        for level in base.levels {
            let lifted = level
                .into_iter()
                .map(|method| {
                    let inner = method.clone();
                    method.with_call(Arc::new(move |target: &AnyObject, args: &[&dyn Any]| {
                        let target = target
                            .downcast_ref::<T>()
                            .ok_or(EventError::TargetType(T::type_name()))?;
                        inner.invoke(project(target), args)
                    }))
                })
                .collect();
            self.levels.push(lifted);
        }
        self
    }

    /// Number of methods declared directly on `T`.
    #[must_use]
    pub fn own_method_count(&self) -> usize {
        self.levels[0].len()
    }
}
