use alloc::boxed::Box;
use core::any::TypeId;

use super::{instantiate::InstantiateErrorKind, instantiator::InstantiatorErrorKind};
use crate::key::BindingKey;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("No provider registered for {key}")]
    NoProvider { key: BindingKey },
    #[error("Provider for {expected} produced a value of different type id {actual:?}")]
    IncorrectType { expected: BindingKey, actual: TypeId },
    #[error("Declaring scope for {key} is gone")]
    ScopeDropped { key: BindingKey },
    #[error(transparent)]
    Instantiator(InstantiatorErrorKind<Box<ResolveErrorKind>, InstantiateErrorKind>),
}
