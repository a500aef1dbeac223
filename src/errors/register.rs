use super::annotation::AnnotationErrorKind;
use crate::key::BindingKey;

#[derive(thiserror::Error, Debug)]
pub enum RegisterErrorKind {
    #[error(transparent)]
    Annotation(#[from] AnnotationErrorKind),
    #[error("Binding {key} already registered in scope \"{scope}\"")]
    Duplicate { key: BindingKey, scope: &'static str },
    #[error("Group bindings can't be decorated")]
    DecorateIntoGroup,
}
