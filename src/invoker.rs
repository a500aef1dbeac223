use alloc::boxed::Box;
use tracing::debug;

use crate::{
    context::Context,
    dependency_resolver::DependencyResolver,
    errors::{InstantiatorErrorKind, InvokeErrorKind, ResolveErrorKind},
    scope::Scope,
    service::{service_fn, BoxCloneService},
};

/// A function run for its effect once the application starts, with its
/// parameters resolved from the scope it was declared in.
pub trait Invoker<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Error: Into<InvokeErrorKind>;

    fn invoke(&mut self, dependencies: Deps) -> Result<(), Self::Error>;
}

pub(crate) type BoxedCloneInvoker = BoxCloneService<Scope, (), InstantiatorErrorKind<ResolveErrorKind, InvokeErrorKind>>;

#[must_use]
pub(crate) fn boxed_invoker<F, Deps>(invoker: F) -> BoxedCloneInvoker
where
    F: Invoker<Deps> + Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    BoxCloneService(Box::new(service_fn({
        move |scope: Scope| {
            let dependencies = match Deps::resolve(&scope, &Context::new(), &[]) {
                Ok(dependencies) => dependencies,
                Err(err) => return Err(InstantiatorErrorKind::Deps(err)),
            };
            match invoker.clone().invoke(dependencies) {
                Ok(()) => {
                    debug!("Invoked");
                    Ok(())
                }
                Err(err) => Err(InstantiatorErrorKind::Factory(err.into())),
            }
        }
    })))
}

macro_rules! impl_invoker {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Err, $($ty,)*> Invoker<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<(), Err> + Clone + 'static,
            Err: Into<InvokeErrorKind>,
            $( $ty: DependencyResolver<Error = ResolveErrorKind>, )*
        {
            type Error = Err;

            fn invoke(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<(), Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_invoker);
