use super::{context::Context, errors::ResolveErrorKind, key::ParamKey};
use crate::scope::Scope;

pub trait DependencyResolver: Sized {
    type Error: Into<ResolveErrorKind>;

    /// Number of constructor parameters this resolver consumes.
    const ARITY: usize;

    /// Resolves the dependency from the scope chain.
    ///
    /// `keys` carries one requested key per consumed parameter; missing
    /// entries fall back to the unqualified key.
    fn resolve(scope: &Scope, context: &Context, keys: &[ParamKey]) -> Result<Self, Self::Error>;
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver<Error = ResolveErrorKind>, )*
        {
            type Error = ResolveErrorKind;

            const ARITY: usize = 0 $(+ count_one!($ty))*;

            #[inline]
            #[allow(unused_variables, unused_mut)]
            fn resolve(scope: &Scope, context: &Context, keys: &[ParamKey]) -> Result<Self, Self::Error> {
                let mut keys = keys.iter().copied();
                Ok(($(
                    {
                        let key = keys.next().unwrap_or_default();
                        $ty::resolve(scope, context, core::slice::from_ref(&key))?
                    },
                )*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
