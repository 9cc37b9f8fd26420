use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid response from catalog: {0}")]
    InvalidResponse(String),

    #[error("price parse error: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}
