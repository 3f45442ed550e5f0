//! Argument tuples for arities 0 through 4.
//!
//! Every typed call in the crate is parameterized by a tuple `Args`
//! implementing [`ArgList`]. The tuple knows how to describe itself for
//! signature matching, how to check and clone itself out of an erased
//! argument buffer, and how to erase itself into a fresh buffer.

use core::any::Any;

use smallvec::{SmallVec, smallvec};

use crate::EventError;
use crate::reflect::ParamType;

/// Erased argument buffer. Inline for every supported arity.
pub type ArgBuffer<'a> = SmallVec<[&'a dyn Any; 4]>;

/// A tuple of event arguments.
pub trait ArgList: Sized + 'static {
    /// Number of arguments.
    const ARITY: usize;

    /// Parameter descriptors, in order.
    fn param_types() -> Vec<ParamType>;

    /// Check an erased buffer and clone the arguments out of it.
    ///
    /// Fails with [`EventError::ArgumentCount`] if the buffer has the wrong
    /// length, and with [`EventError::ArgumentType`] for the first slot that
    /// does not hold the declared type.
    fn from_args(args: &[&dyn Any]) -> Result<Self, EventError>;

    /// Erase into a fresh buffer borrowing from `self`.
    fn to_args(&self) -> ArgBuffer<'_>;
}

fn arg<T: Clone + 'static>(args: &[&dyn Any], index: usize) -> Result<T, EventError> {
    args[index]
        .downcast_ref::<T>()
        .cloned()
        .ok_or(EventError::ArgumentType {
            index,
            expected: core::any::type_name::<T>(),
        })
}

macro_rules! impl_arg_list {
    ($arity:literal; $($ty:ident $idx:tt),*) => {
        impl<$($ty: Clone + 'static),*> ArgList for ($($ty,)*) {
            const ARITY: usize = $arity;

            fn param_types() -> Vec<ParamType> {
                vec![$(ParamType::of::<$ty>()),*]
            }

            fn from_args(args: &[&dyn Any]) -> Result<Self, EventError> {
                if args.len() != $arity {
                    return Err(EventError::ArgumentCount {
                        expected: $arity,
                        actual: args.len(),
                    });
                }
                Ok(($(arg::<$ty>(args, $idx)?,)*))
            }

            fn to_args(&self) -> ArgBuffer<'_> {
                smallvec![$(&self.$idx as &dyn Any),*]
            }
        }
    };
}

impl_arg_list!(0;);
impl_arg_list!(1; A 0);
impl_arg_list!(2; A 0, B 1);
impl_arg_list!(3; A 0, B 1, C 2);
impl_arg_list!(4; A 0, B 1, C 2, D 3);
