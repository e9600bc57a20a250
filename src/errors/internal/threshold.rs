use thiserror::Error;

#[derive(Error, Debug)]
pub enum ThresholdConfigError {
    #[error("Validation error: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Configuration not found: {0}")]
    NotFound(i32),

    #[error("Only draft configurations can be published (status: {status})")]
    InvalidState { config_id: i32, status: String },
}
