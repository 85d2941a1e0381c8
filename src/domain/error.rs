//! Domain error types.

/// Top-level error type for nlmatrader.
#[derive(Debug, thiserror::Error)]
pub enum NlmaError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient data: have {bars} bars, need {minimum}")]
    InsufficientData { bars: usize, minimum: usize },

    #[error("timestamps not strictly increasing at bar {index}")]
    UnorderedTimestamps { index: usize },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl NlmaError {
    pub(crate) fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        NlmaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&NlmaError> for std::process::ExitCode {
    fn from(err: &NlmaError) -> Self {
        let code: u8 = match err {
            NlmaError::Io(_) | NlmaError::Report { .. } => 1,
            NlmaError::ConfigParse { .. }
            | NlmaError::ConfigMissing { .. }
            | NlmaError::ConfigInvalid { .. } => 2,
            NlmaError::Data { .. } => 3,
            NlmaError::InsufficientData { .. } | NlmaError::UnorderedTimestamps { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
