#![no_std]

extern crate alloc;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod annotate;
pub(crate) mod any;
pub(crate) mod app;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod event;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod invoker;
pub(crate) mod key;
pub(crate) mod module;
pub(crate) mod scope;
pub(crate) mod service;

pub use annotate::{annotate, Annotated, Annotation};
pub use app::{App, AppState};
pub use context::Context;
pub use dependency_resolver::DependencyResolver;
pub use errors::{
    AnnotationErrorKind, AppErrorKind, InstantiateErrorKind, InstantiatorErrorKind, InvokeErrorKind, RegisterErrorKind, ResolveErrorKind,
};
pub use event::{Event, EventHandler, TracingLogger};
pub use inject::{Inject, InjectTransient};
pub use instantiator::{instance, Instantiator};
pub use invoker::Invoker;
pub use key::{BindingKey, ParamKey, Qualifier};
pub use module::{decorate, invoke, module, provide, supply, IntoProvide, ModuleOption};
pub use scope::Scope;
