#[derive(Debug, thiserror::Error)]
pub enum ScreenError {
    #[error("invalid {field} for '{subject}': {value} is outside [0, 1]")]
    Validation {
        subject: String,
        field: String,
        value: f64,
    },

    #[error("invalid {field} for '{subject}': expected lower <= mean <= upper, got {lower}, {mean}, {upper}")]
    EstimateOrder {
        subject: String,
        field: String,
        lower: f64,
        mean: f64,
        upper: f64,
    },

    #[error("invalid test name '{name}': {reason}")]
    TestName { name: String, reason: String },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load topology library from {source_name}: {reason}")]
    LibraryLoad { source_name: String, reason: String },

    #[error("invalid topology library: {0}")]
    LibraryInvalid(String),

    #[error("unknown topology '{0}'")]
    UnknownTopology(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScreenError {
    pub(crate) fn validation(subject: &str, field: &str, value: f64) -> Self {
        ScreenError::Validation {
            subject: subject.to_string(),
            field: field.to_string(),
            value,
        }
    }
}
