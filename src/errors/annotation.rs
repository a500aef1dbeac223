#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationErrorKind {
    #[error("Parameter keys count (is {actual}) doesn't match constructor arity (is {expected})")]
    ParamArityMismatch { expected: usize, actual: usize },
    #[error("Result keys count (is {actual}) doesn't match constructor outputs (is {expected})")]
    ResultArityMismatch { expected: usize, actual: usize },
    #[error("Binding of {type_name} can't be both named \"{name}\" and grouped \"{group}\"")]
    NameGroupConflict {
        type_name: &'static str,
        name: &'static str,
        group: &'static str,
    },
}
