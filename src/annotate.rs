use alloc::{boxed::Box, vec::Vec};
use core::any::type_name;

use crate::{
    any::TypeInfo,
    dependency_resolver::DependencyResolver,
    errors::{AnnotationErrorKind, InstantiatorErrorKind, ResolveErrorKind},
    instantiator::{boxed_instantiator, BoxedAny, BoxedCloneInstantiator, Config, InstantiateRequest, Instantiator},
    key::{BindingKey, ParamKey, Qualifier},
    scope::Registration,
    service::{service_fn, BoxCloneService},
};

/// A single rewrite of a constructor's signature: a key for its result or
/// per-parameter keys for its inputs. Later annotations of the same kind
/// replace earlier ones.
#[derive(Debug, Clone)]
pub struct Annotation(AnnotationKind);

#[derive(Debug, Clone)]
enum AnnotationKind {
    Name(&'static str),
    Group(&'static str),
    ParamKeys(Vec<ParamKey>),
    ResultKeys(Vec<ParamKey>),
}

impl Annotation {
    /// Registers the result under a name instead of the plain type key.
    #[inline]
    #[must_use]
    pub fn name(name: &'static str) -> Self {
        Self(AnnotationKind::Name(name))
    }

    /// Contributes the result to a value group instead of the plain type key.
    #[inline]
    #[must_use]
    pub fn group(group: &'static str) -> Self {
        Self(AnnotationKind::Group(group))
    }

    /// Keys requested for the constructor parameters, one per parameter.
    #[inline]
    #[must_use]
    pub fn param_keys(keys: impl IntoIterator<Item = ParamKey>) -> Self {
        Self(AnnotationKind::ParamKeys(keys.into_iter().collect()))
    }

    /// Keys attached to the constructor results, one per result.
    #[inline]
    #[must_use]
    pub fn result_keys(keys: impl IntoIterator<Item = ParamKey>) -> Self {
        Self(AnnotationKind::ResultKeys(keys.into_iter().collect()))
    }
}

/// A constructor with its annotations folded in, ready for installation.
/// Annotation errors are deferred until the application registers it, so
/// declaration sites stay infallible.
pub struct Annotated {
    pub(crate) result: Result<Registration, AnnotationErrorKind>,
    pub(crate) constructor: &'static str,
}

struct Draft {
    arity: usize,
    provides: TypeInfo,
    param_keys: Vec<ParamKey>,
    name: Option<&'static str>,
    group: Option<&'static str>,
}

impl Draft {
    fn new(arity: usize, provides: TypeInfo) -> Self {
        Self {
            arity,
            provides,
            param_keys: Vec::new(),
            name: None,
            group: None,
        }
    }

    fn apply(&mut self, Annotation(kind): Annotation) -> Result<(), AnnotationErrorKind> {
        match kind {
            AnnotationKind::Name(name) => self.set_name(name),
            AnnotationKind::Group(group) => self.set_group(group),
            AnnotationKind::ParamKeys(keys) => {
                if keys.len() != self.arity {
                    return Err(AnnotationErrorKind::ParamArityMismatch {
                        expected: self.arity,
                        actual: keys.len(),
                    });
                }
                self.param_keys = keys;
                Ok(())
            }
            AnnotationKind::ResultKeys(keys) => {
                if keys.len() != 1 {
                    return Err(AnnotationErrorKind::ResultArityMismatch {
                        expected: 1,
                        actual: keys.len(),
                    });
                }
                match keys[0].qualifier() {
                    Some(Qualifier::Name(name)) => self.set_name(name),
                    Some(Qualifier::Group(group)) => self.set_group(group),
                    None => Ok(()),
                }
            }
        }
    }

    fn set_name(&mut self, name: &'static str) -> Result<(), AnnotationErrorKind> {
        if let Some(group) = self.group {
            return Err(AnnotationErrorKind::NameGroupConflict {
                type_name: self.provides.name,
                name,
                group,
            });
        }
        self.name = Some(name);
        Ok(())
    }

    fn set_group(&mut self, group: &'static str) -> Result<(), AnnotationErrorKind> {
        if let Some(name) = self.name {
            return Err(AnnotationErrorKind::NameGroupConflict {
                type_name: self.provides.name,
                name,
                group,
            });
        }
        self.group = Some(group);
        Ok(())
    }
}

/// Folds annotations over a constructor, producing the binding that the
/// application will install. A grouped result also carries the collector
/// binding for `Vec<T>` under the same group key.
pub fn annotate<Inst, Deps>(instantiator: Inst, annotations: impl IntoIterator<Item = Annotation>) -> Annotated
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: Send + Sync,
    Deps: DependencyResolver<Error = ResolveErrorKind>,
{
    let constructor = type_name::<Inst>();

    let mut draft = Draft::new(Deps::ARITY, TypeInfo::of::<Inst::Provides>());
    for annotation in annotations {
        if let Err(err) = draft.apply(annotation) {
            return Annotated {
                result: Err(err),
                constructor,
            };
        }
    }

    let instantiator = boxed_instantiator(instantiator, draft.param_keys.into_boxed_slice());

    let registration = match draft.group {
        Some(group) => {
            let element_key = BindingKey::new(draft.provides, Some(Qualifier::Group(group)));
            Registration::Group {
                element_key,
                element: instantiator,
                collector_key: BindingKey::of::<Vec<Inst::Provides>>(Some(Qualifier::Group(group))),
                collector: group_collector::<Inst::Provides>(element_key),
            }
        }
        None => Registration::Binding {
            key: BindingKey::new(draft.provides, draft.name.map(Qualifier::Name)),
            instantiator,
            config: Config::default(),
        },
    };

    Annotated {
        result: Ok(registration),
        constructor,
    }
}

/// Collector run when `Vec<T>` is requested under a group key: builds every
/// element of the group, root first, in registration order.
fn group_collector<T: Send + Sync + 'static>(element_key: BindingKey) -> BoxedCloneInstantiator {
    BoxCloneService(Box::new(service_fn(move |InstantiateRequest { scope, context }| {
        let slots = scope.group_slots(&element_key);
        let mut values = Vec::with_capacity(slots.len());
        for slot in slots {
            let boxed = scope.run_slot(&slot, &element_key, &context)?;
            match boxed.downcast::<T>() {
                Ok(value) => values.push(*value),
                Err(incorrect_type) => {
                    return Err(InstantiatorErrorKind::Deps(ResolveErrorKind::IncorrectType {
                        expected: element_key,
                        actual: (*incorrect_type).type_id(),
                    }))
                }
            }
        }
        Ok(Box::new(values) as BoxedAny)
    })))
}
