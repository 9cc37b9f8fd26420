use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing credential: {0}")]
    MissingCredential(&'static str),

    #[error("invalid value for {key}: {value:?}")]
    InvalidConfig { key: &'static str, value: String },
}
