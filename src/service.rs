mod base;
mod boxed_clone;
mod fn_service;

pub(crate) use base::Service;
pub(crate) use boxed_clone::BoxCloneService;
pub(crate) use fn_service::service_fn;
