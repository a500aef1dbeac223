use alloc::sync::Arc;

use crate::{context::Context, dependency_resolver::DependencyResolver, errors::ResolveErrorKind, key::ParamKey, scope::Scope};

/// Shared dependency handle. Resolution goes through the scope cache.
pub struct Inject<Dep>(pub Arc<Dep>);

impl<Dep: Send + Sync + 'static> DependencyResolver for Inject<Dep> {
    type Error = ResolveErrorKind;

    const ARITY: usize = 1;

    fn resolve(scope: &Scope, context: &Context, keys: &[ParamKey]) -> Result<Self, Self::Error> {
        let key = keys.first().copied().unwrap_or_default();
        scope.get_in_context(key.qualifier(), context).map(Self)
    }
}

/// Owned dependency built fresh on every resolution, bypassing the cache
/// and any decorators.
pub struct InjectTransient<Dep>(pub Dep);

impl<Dep: 'static> DependencyResolver for InjectTransient<Dep> {
    type Error = ResolveErrorKind;

    const ARITY: usize = 1;

    fn resolve(scope: &Scope, context: &Context, keys: &[ParamKey]) -> Result<Self, Self::Error> {
        let key = keys.first().copied().unwrap_or_default();
        scope.get_transient_in_context(key.qualifier(), context).map(Self)
    }
}
