use alloc::{
    boxed::Box,
    collections::{btree_map::Entry, BTreeMap, BTreeSet},
    sync::{Arc, Weak},
    vec::Vec,
};
use core::any::type_name;
use parking_lot::Mutex;
use tracing::{debug, debug_span, error, warn};

use crate::{
    any::RcAny,
    context::Context,
    errors::{InstantiateErrorKind, InstantiatorErrorKind, RegisterErrorKind, ResolveErrorKind},
    instantiator::{BoxedAny, BoxedCloneInstantiator, Config, InstantiateRequest},
    key::{BindingKey, Qualifier},
    service::Service as _,
};

/// One node of the scope chain.
///
/// Scopes form a tree mirroring the module tree, rooted in a single runtime
/// scope. Exported bindings live at the root; decorators stay at the scope
/// that declared them and are visible to that scope and its descendants only.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

struct ScopeInner {
    name: &'static str,
    parent: Option<Scope>,
    providers: Mutex<BTreeMap<BindingKey, ProviderSlot>>,
    groups: Mutex<BTreeMap<BindingKey, Vec<ProviderSlot>>>,
    decorators: Mutex<BTreeMap<BindingKey, Vec<BoxedCloneInstantiator>>>,
    cache: Mutex<BTreeMap<BindingKey, RcAny>>,
    decorating: Mutex<BTreeSet<BindingKey>>,
}

#[derive(Clone)]
pub(crate) struct ProviderSlot {
    instantiator: BoxedCloneInstantiator,
    config: Config,
    // Weak link back to the declaring scope, so that dependencies of the
    // bound constructor resolve through the declaring module's chain while
    // the binding itself may be stored at the root.
    owner: Weak<ScopeInner>,
}

/// Erased binding produced by annotation, ready to be installed into a scope.
#[derive(Clone)]
pub(crate) enum Registration {
    Binding {
        key: BindingKey,
        instantiator: BoxedCloneInstantiator,
        config: Config,
    },
    Group {
        element_key: BindingKey,
        element: BoxedCloneInstantiator,
        collector_key: BindingKey,
        collector: BoxedCloneInstantiator,
    },
}

#[derive(Debug)]
pub(crate) struct RegistrationInfo {
    pub(crate) key: BindingKey,
}

impl Scope {
    #[must_use]
    pub(crate) fn root(name: &'static str) -> Self {
        Self {
            inner: Arc::new(ScopeInner::new(name, None)),
        }
    }

    #[must_use]
    pub(crate) fn child(&self, name: &'static str) -> Self {
        Self {
            inner: Arc::new(ScopeInner::new(name, Some(self.clone()))),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&Scope> {
        self.inner.parent.as_ref()
    }

    #[must_use]
    fn top(&self) -> Scope {
        let mut current = self.clone();
        while let Some(parent) = current.parent().cloned() {
            current = parent;
        }
        current
    }

    /// Installs a binding. Exported bindings land at the root scope,
    /// non-exported ones stay here; either way their constructor
    /// dependencies resolve through this scope's chain.
    pub(crate) fn register(&self, registration: Registration, export: bool) -> Result<RegistrationInfo, RegisterErrorKind> {
        let target = if export { self.top() } else { self.clone() };

        match registration {
            Registration::Binding { key, instantiator, config } => match target.inner.providers.lock().entry(key) {
                Entry::Occupied(_) => Err(RegisterErrorKind::Duplicate {
                    key,
                    scope: target.inner.name,
                }),
                Entry::Vacant(entry) => {
                    entry.insert(ProviderSlot {
                        instantiator,
                        config,
                        owner: Arc::downgrade(&self.inner),
                    });
                    Ok(RegistrationInfo { key })
                }
            },
            Registration::Group {
                element_key,
                element,
                collector_key,
                collector,
            } => {
                target.inner.providers.lock().entry(collector_key).or_insert_with(|| ProviderSlot {
                    instantiator: collector,
                    config: Config { cache_provides: false },
                    owner: Arc::downgrade(&target.inner),
                });
                target.inner.groups.lock().entry(element_key).or_default().push(ProviderSlot {
                    instantiator: element,
                    config: Config { cache_provides: false },
                    owner: Arc::downgrade(&self.inner),
                });
                Ok(RegistrationInfo { key: element_key })
            }
        }
    }

    /// Installs a decorator for `key` at this scope.
    pub(crate) fn register_decorator(&self, registration: Registration) -> Result<RegistrationInfo, RegisterErrorKind> {
        match registration {
            Registration::Binding { key, instantiator, .. } => {
                self.inner.decorators.lock().entry(key).or_default().push(instantiator);
                Ok(RegistrationInfo { key })
            }
            Registration::Group { .. } => Err(RegisterErrorKind::DecorateIntoGroup),
        }
    }

    /// Resolves the unqualified binding of `Dep`, walking this scope's chain.
    pub fn get<Dep: Send + Sync + 'static>(&self) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_in_context(None, &Context::new())
    }

    /// Resolves the binding of `Dep` under the given qualifier.
    pub fn get_keyed<Dep: Send + Sync + 'static>(&self, qualifier: Qualifier) -> Result<Arc<Dep>, ResolveErrorKind> {
        self.get_in_context(Some(qualifier), &Context::new())
    }

    pub(crate) fn get_in_context<Dep: Send + Sync + 'static>(
        &self,
        qualifier: Option<Qualifier>,
        context: &Context,
    ) -> Result<Arc<Dep>, ResolveErrorKind> {
        let span = debug_span!("resolve", dependency = type_name::<Dep>());
        let _guard = span.enter();

        if let Some(dependency) = context.get::<Dep>() {
            debug!("Found in context");
            return Ok(dependency);
        }

        let key = BindingKey::of::<Dep>(qualifier);
        let value = self.resolve_erased(&key, context, true)?;
        match value.downcast::<Dep>() {
            Ok(dependency) => Ok(dependency),
            Err(incorrect_type) => {
                let err = ResolveErrorKind::IncorrectType {
                    expected: key,
                    actual: (*incorrect_type).type_id(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Builds a fresh value of `Dep`, bypassing the cache and decorators.
    pub(crate) fn get_transient_in_context<Dep: 'static>(
        &self,
        qualifier: Option<Qualifier>,
        context: &Context,
    ) -> Result<Dep, ResolveErrorKind> {
        let span = debug_span!("resolve_transient", dependency = type_name::<Dep>());
        let _guard = span.enter();

        let key = BindingKey::of::<Dep>(qualifier);

        let mut current = Some(self.clone());
        while let Some(scope) = current {
            let slot = scope.inner.providers.lock().get(&key).cloned();
            if let Some(slot) = slot {
                let boxed = scope.run_slot(&slot, &key, context).map_err(lift_instantiator_err)?;
                return match boxed.downcast::<Dep>() {
                    Ok(dependency) => Ok(*dependency),
                    Err(incorrect_type) => {
                        let err = ResolveErrorKind::IncorrectType {
                            expected: key,
                            actual: (*incorrect_type).type_id(),
                        };
                        error!("{}", err);
                        Err(err)
                    }
                };
            }
            current = scope.parent().cloned();
        }

        let err = ResolveErrorKind::NoProvider { key };
        warn!("{}", err);
        Err(err)
    }

    fn resolve_erased(&self, key: &BindingKey, context: &Context, use_cache: bool) -> Result<RcAny, ResolveErrorKind> {
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            if use_cache {
                if let Some(value) = scope.inner.cache.lock().get(key).cloned() {
                    debug!("Found in cache");
                    return Ok(value);
                }
            }

            let stack = scope.inner.decorators.lock().get(key).cloned();
            if let Some(stack) = stack {
                if !stack.is_empty() && !scope.inner.decorating.lock().contains(key) {
                    let value = scope.run_decorator_stack(key, stack, context)?;
                    if use_cache {
                        scope.inner.cache.lock().insert(*key, value.clone());
                    }
                    return Ok(value);
                }
            }

            let slot = scope.inner.providers.lock().get(key).cloned();
            if let Some(slot) = slot {
                let boxed = scope.run_slot(&slot, key, context).map_err(lift_instantiator_err)?;
                let value: RcAny = Arc::from(boxed);
                if use_cache && slot.config.cache_provides {
                    scope.inner.cache.lock().insert(*key, value.clone());
                }
                return Ok(value);
            }

            current = scope.parent().cloned();
        }

        let err = ResolveErrorKind::NoProvider { key: *key };
        warn!("{}", err);
        Err(err)
    }

    /// Runs the decorator stack in declaration order. The decorating marker
    /// lets a decorator resolve the undecorated value through this same
    /// scope; each finished layer is seeded into the context so the next
    /// layer wraps it instead of the base.
    fn run_decorator_stack(
        &self,
        key: &BindingKey,
        stack: Vec<BoxedCloneInstantiator>,
        context: &Context,
    ) -> Result<RcAny, ResolveErrorKind> {
        self.inner.decorating.lock().insert(*key);
        let result = self.run_decorators(key, stack, context);
        self.inner.decorating.lock().remove(key);
        result
    }

    fn run_decorators(&self, key: &BindingKey, stack: Vec<BoxedCloneInstantiator>, context: &Context) -> Result<RcAny, ResolveErrorKind> {
        let mut context = context.clone();
        let mut value: Option<RcAny> = None;
        for mut decorator in stack {
            let boxed = decorator
                .call(InstantiateRequest {
                    scope: self.clone(),
                    context: context.clone(),
                })
                .map_err(lift_instantiator_err)?;
            let decorated: RcAny = Arc::from(boxed);
            context.insert_raw(key.type_info.id, decorated.clone());
            value = Some(decorated);
        }
        Ok(value.expect("decorator stack checked non-empty before run"))
    }

    /// Runs a slot's instantiator with its declaring scope, so the
    /// constructor's own dependencies resolve where the binding was declared.
    /// Fails if the declaring scope has already been dropped, which happens
    /// when a cloned [`Scope`] outlives the [`App`](crate::App) it came from.
    pub(crate) fn run_slot(
        &self,
        slot: &ProviderSlot,
        key: &BindingKey,
        context: &Context,
    ) -> Result<BoxedAny, InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>> {
        let Some(owner) = slot.owner.upgrade() else {
            let err = ResolveErrorKind::ScopeDropped { key: *key };
            warn!("{}", err);
            return Err(InstantiatorErrorKind::Deps(err));
        };
        let owner = Scope { inner: owner };
        let mut instantiator = slot.instantiator.clone();
        instantiator.call(InstantiateRequest {
            scope: owner,
            context: context.clone(),
        })
    }

    /// All group element slots for `key`, root first, in registration order.
    pub(crate) fn group_slots(&self, key: &BindingKey) -> Vec<ProviderSlot> {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(scope) = current {
            current = scope.parent().cloned();
            chain.push(scope);
        }

        let mut slots = Vec::new();
        for scope in chain.iter().rev() {
            if let Some(elements) = scope.inner.groups.lock().get(key) {
                slots.extend(elements.iter().cloned());
            }
        }
        slots
    }

    #[cfg(test)]
    pub(crate) fn register_instantiator(
        &self,
        key: BindingKey,
        instantiator: BoxedCloneInstantiator,
        config: Config,
    ) -> Result<RegistrationInfo, RegisterErrorKind> {
        self.register(Registration::Binding { key, instantiator, config }, false)
    }
}

impl ScopeInner {
    fn new(name: &'static str, parent: Option<Scope>) -> Self {
        Self {
            name,
            parent,
            providers: Mutex::new(BTreeMap::new()),
            groups: Mutex::new(BTreeMap::new()),
            decorators: Mutex::new(BTreeMap::new()),
            cache: Mutex::new(BTreeMap::new()),
            decorating: Mutex::new(BTreeSet::new()),
        }
    }
}

fn lift_instantiator_err(err: InstantiatorErrorKind<ResolveErrorKind, InstantiateErrorKind>) -> ResolveErrorKind {
    match err {
        InstantiatorErrorKind::Deps(err) => {
            error!("{}", err);
            ResolveErrorKind::Instantiator(InstantiatorErrorKind::Deps(Box::new(err)))
        }
        InstantiatorErrorKind::Factory(err) => {
            error!("{}", err);
            ResolveErrorKind::Instantiator(InstantiatorErrorKind::Factory(err))
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::{
        boxed::Box,
        format,
        string::{String, ToString},
    };
    use tracing_test::traced_test;

    use super::{BindingKey, Config, Registration, ResolveErrorKind, Scope};
    use crate::{errors::InstantiateErrorKind, inject::Inject, instantiator::boxed_instantiator};

    fn binding<T: Send + Sync + 'static>(
        instantiator: crate::instantiator::BoxedCloneInstantiator,
    ) -> Registration {
        Registration::Binding {
            key: BindingKey::of::<T>(None),
            instantiator,
            config: Config::default(),
        }
    }

    #[test]
    fn test_parent_chain() {
        let root = Scope::root("runtime");
        let app = root.child("app");
        let child = app.child("redis");

        assert_eq!(child.name(), "redis");
        assert_eq!(child.parent().unwrap().name(), "app");
        assert_eq!(child.top().name(), "runtime");
    }

    #[test]
    #[traced_test]
    fn test_duplicate_binding() {
        let root = Scope::root("runtime");
        let app = root.child("app");

        app.register(
            binding::<String>(boxed_instantiator(|| Ok::<_, InstantiateErrorKind>(String::from("one")), Box::from([]))),
            true,
        )
        .unwrap();
        let err = app
            .register(
                binding::<String>(boxed_instantiator(|| Ok::<_, InstantiateErrorKind>(String::from("two")), Box::from([]))),
                true,
            )
            .unwrap_err();

        assert!(matches!(err, crate::errors::RegisterErrorKind::Duplicate { .. }));
    }

    #[test]
    #[traced_test]
    fn test_missing_provider() {
        let root = Scope::root("runtime");
        let err = root.get::<String>().unwrap_err();
        assert!(matches!(err, ResolveErrorKind::NoProvider { .. }));
    }

    #[test]
    #[traced_test]
    fn test_decorators_apply_in_declaration_order() {
        let root = Scope::root("runtime");
        let app = root.child("app");

        app.register(
            binding::<String>(boxed_instantiator(|| Ok::<_, InstantiateErrorKind>(String::from("base")), Box::from([]))),
            true,
        )
        .unwrap();
        app.register_decorator(binding::<String>(boxed_instantiator(
            |Inject(value): Inject<String>| Ok::<_, InstantiateErrorKind>(format!("{value}+a")),
            Box::from([]),
        )))
        .unwrap();
        app.register_decorator(binding::<String>(boxed_instantiator(
            |Inject(value): Inject<String>| Ok::<_, InstantiateErrorKind>(format!("{value}+b")),
            Box::from([]),
        )))
        .unwrap();

        assert_eq!(*app.get::<String>().unwrap(), "base+a+b");
        // The undecorated value stays visible outside this scope's subtree.
        assert_eq!(*root.get::<String>().unwrap(), "base");
    }

    #[test]
    #[traced_test]
    fn test_decorated_value_cached_per_scope() {
        use core::sync::atomic::{AtomicU8, Ordering};

        static CALLS: AtomicU8 = AtomicU8::new(0);

        let root = Scope::root("runtime");
        let app = root.child("app");

        app.register(
            binding::<String>(boxed_instantiator(
                || {
                    CALLS.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, InstantiateErrorKind>(String::from("base"))
                },
                Box::from([]),
            )),
            true,
        )
        .unwrap();
        app.register_decorator(binding::<String>(boxed_instantiator(
            |Inject(value): Inject<String>| Ok::<_, InstantiateErrorKind>(format!("{value}!")),
            Box::from([]),
        )))
        .unwrap();

        assert_eq!(*app.get::<String>().unwrap(), "base!");
        assert_eq!(*app.get::<String>().unwrap(), "base!");
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
