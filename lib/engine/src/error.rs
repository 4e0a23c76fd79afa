use cacao_similarity::WeightError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Product not found: {0}")]
    NotFound(String),

    #[error("Catalog error: {0}")]
    Catalog(#[from] cacao_catalog::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid weights: {0}")]
    Weights(#[from] WeightError),
}
