mod annotation;
mod app;
mod instantiate;
mod instantiator;
mod invoke;
mod register;
mod resolve;

pub use annotation::AnnotationErrorKind;
pub use app::AppErrorKind;
pub use instantiate::InstantiateErrorKind;
pub use instantiator::InstantiatorErrorKind;
pub use invoke::InvokeErrorKind;
pub use register::RegisterErrorKind;
pub use resolve::ResolveErrorKind;
