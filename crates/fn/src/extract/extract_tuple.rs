use crate::error::FnError;
use crate::extract::{Param, ParamSpec, Slot};
use crate::{Context, FnRequest};

/// The declared parameter list of a function, as a tuple of [`Param`]s
pub trait Params: Sized + Send + 'static {
    /// Describes each parameter, in declaration order
    fn specs() -> Vec<ParamSpec>;

    /// Binds each parameter from its slot, `slots` has exactly one slot per parameter
    fn bind(slots: &[Slot], ctx: &Context, req: &FnRequest) -> Result<Self, FnError>;
}

impl Params for () {
    fn specs() -> Vec<ParamSpec> {
        Vec::new()
    }

    #[inline]
    fn bind(_slots: &[Slot], _ctx: &Context, _req: &FnRequest) -> Result<Self, FnError> {
        Ok(())
    }
}

macro_rules! impl_params_for_tuple {
    ($($param:ident $index:tt)*) => {
        impl<$($param,)*> Params for ($($param,)*)
        where
            $($param: Param,)*
        {
            fn specs() -> Vec<ParamSpec> {
                vec![$(ParamSpec::of::<$param>(),)*]
            }

            #[inline]
            fn bind(slots: &[Slot], ctx: &Context, req: &FnRequest) -> Result<Self, FnError> {
                Ok(($($param::bind(&slots[$index], ctx, req)?,)*))
            }
        }
    }
}

impl_params_for_tuple! { A 0 }
impl_params_for_tuple! { A 0 B 1 }
impl_params_for_tuple! { A 0 B 1 C 2 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 }
impl_params_for_tuple! { A 0 B 1 C 2 D 3 E 4 F 5 G 6 H 7 I 8 J 9 K 10 L 11 }
