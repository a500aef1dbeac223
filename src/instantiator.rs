use alloc::boxed::Box;
use core::any::Any;
use tracing::debug;

use super::{
    context::Context,
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    key::ParamKey,
    service::{service_fn, BoxCloneService},
};
use crate::scope::Scope;

pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

/// Config for an instantiator
/// ## Fields
/// - `cache_provides`:
///   If `true`, the instance provided by the instantiator will be cached and reused.
///
///   This does **not** affect the dependencies of the instance.
///   Only the final result is cached if caching is applicable.
#[derive(Clone, Copy)]
pub(crate) struct Config {
    pub(crate) cache_provides: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { cache_provides: true }
    }
}

pub(crate) struct InstantiateRequest {
    pub(crate) scope: Scope,
    pub(crate) context: Context,
}

pub(crate) type BoxedAny = Box<dyn Any + Send + Sync>;

pub(crate) type BoxedCloneInstantiator =
    BoxCloneService<InstantiateRequest, BoxedAny, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>>;

#[must_use]
pub(crate) fn boxed_instantiator<Inst, Deps>(instantiator: Inst, param_keys: Box<[ParamKey]>) -> BoxedCloneInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    BoxCloneService(Box::new(service_fn({
        move |InstantiateRequest { scope, context }| {
            let dependencies = match Deps::resolve(&scope, &context, &param_keys) {
                Ok(dependencies) => dependencies,
                Err(err) => return Err(InstantiatorErrorKind::Deps(err)),
            };
            let dependency = match instantiator.clone().instantiate(dependencies) {
                Ok(dependency) => dependency,
                Err(err) => return Err(InstantiatorErrorKind::Factory(err.into())),
            };

            debug!("Instantiated");

            Ok(Box::new(dependency) as _)
        }
    })))
}

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the runtime.
#[inline]
#[must_use]
pub const fn instance<T: Clone + 'static>(val: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok(val.clone())
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver<Error = ResolveErrorKind>, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::{boxed_instantiator, DependencyResolver, InstantiateErrorKind, Instantiator};
    use crate::{context::Context, inject::InjectTransient, key::BindingKey, scope::Scope, service::Service as _};

    use alloc::{
        boxed::Box,
        format,
        string::{String, ToString},
        sync::Arc,
    };
    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    struct Request(bool);
    struct Response(bool);

    #[test]
    #[allow(dead_code)]
    fn test_factory_helper() {
        fn resolver<Deps: DependencyResolver, F: Instantiator<Deps>>(_f: F) {}
        fn resolver_with_dep<Deps: DependencyResolver>() {
            resolver(|| Ok::<_, InstantiateErrorKind>(()));
            resolver(|_: InjectTransient<Request>| Ok::<_, InstantiateErrorKind>(()));
            resolver(|_: InjectTransient<Request>, _: InjectTransient<Response>| {
                Ok::<_, InstantiateErrorKind>(())
            });
        }
    }

    #[test]
    #[traced_test]
    fn test_boxed_instantiator() {
        let request_call_count = Arc::new(AtomicU8::new(0));
        let response_call_count = Arc::new(AtomicU8::new(0));

        let instantiator_request = boxed_instantiator(
            {
                let request_call_count = request_call_count.clone();
                move || {
                    request_call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call instantiator request");
                    Ok::<_, InstantiateErrorKind>(Request(true))
                }
            },
            Box::from([]),
        );
        let mut instantiator_response = boxed_instantiator(
            {
                let response_call_count = response_call_count.clone();
                move |InjectTransient(Request(val_1)), InjectTransient(Request(val_2))| {
                    assert_eq!(val_1, val_2);

                    response_call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call instantiator response");
                    Ok::<_, InstantiateErrorKind>(Response(val_1))
                }
            },
            Box::from([]),
        );

        let scope = Scope::root("runtime");
        scope
            .register_instantiator(BindingKey::of::<Request>(None), instantiator_request, super::Config::default())
            .unwrap();

        let response_1 = instantiator_response
            .call(super::InstantiateRequest {
                scope: scope.clone(),
                context: Context::new(),
            })
            .unwrap();
        let response_2 = instantiator_response
            .call(super::InstantiateRequest {
                scope,
                context: Context::new(),
            })
            .unwrap();

        assert!(response_1.downcast::<Response>().unwrap().0);
        assert!(response_2.downcast::<Response>().unwrap().0);
        assert_eq!(request_call_count.load(Ordering::SeqCst), 4);
        assert_eq!(response_call_count.load(Ordering::SeqCst), 2);
    }
}
