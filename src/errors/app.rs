use alloc::string::String;
use core::panic::Location;

use super::{instantiator::InstantiatorErrorKind, invoke::InvokeErrorKind, register::RegisterErrorKind, resolve::ResolveErrorKind};
use crate::app::AppState;

#[derive(thiserror::Error, Debug)]
pub enum AppErrorKind {
    #[error("Constructor {constructor} in module \"{module}\" ({origin}): {source}")]
    Provide {
        constructor: &'static str,
        module: String,
        origin: &'static Location<'static>,
        source: RegisterErrorKind,
    },
    #[error("Decorator {decorator} in module \"{module}\" ({origin}): {source}")]
    Decorate {
        decorator: &'static str,
        module: String,
        origin: &'static Location<'static>,
        source: RegisterErrorKind,
    },
    #[error("Function {function} in module \"{module}\" ({origin}): {source}")]
    Invoke {
        function: &'static str,
        module: String,
        origin: &'static Location<'static>,
        source: InstantiatorErrorKind<ResolveErrorKind, InvokeErrorKind>,
    },
    #[error("Application already started (state is {0:?})")]
    AlreadyStarted(AppState),
}
