#[derive(thiserror::Error, Debug)]
pub enum InvokeErrorKind {
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}
