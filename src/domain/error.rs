//! Domain error types.

/// An order the portfolio collaborator refused to fill.
///
/// Never fatal to a run: the lifecycle reports it and moves on to the next bar.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("order for {token_id} rejected: {reason}")]
pub struct OrderRejected {
    pub token_id: String,
    pub reason: String,
}

impl OrderRejected {
    pub fn new(token_id: &str, reason: impl Into<String>) -> Self {
        Self {
            token_id: token_id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Top-level error type for probtrader.
#[derive(Debug, thiserror::Error)]
pub enum ProbtraderError {
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

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("data parse error: {reason}")]
    DataParse { reason: String },

    #[error("no data: {reason}")]
    NoData { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ProbtraderError {
    pub(crate) fn invalid_param(key: &str, reason: impl Into<String>) -> Self {
        ProbtraderError::ConfigInvalid {
            section: "params".to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&ProbtraderError> for std::process::ExitCode {
    fn from(err: &ProbtraderError) -> Self {
        let code: u8 = match err {
            ProbtraderError::Io(_) => 1,
            ProbtraderError::ConfigParse { .. }
            | ProbtraderError::ConfigMissing { .. }
            | ProbtraderError::ConfigInvalid { .. } => 2,
            ProbtraderError::UnknownStrategy { .. } => 4,
            ProbtraderError::DataParse { .. } | ProbtraderError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_rejected_display() {
        let err = OrderRejected::new("tok-1", "insufficient capital");
        assert_eq!(
            err.to_string(),
            "order for tok-1 rejected: insufficient capital"
        );
    }

    #[test]
    fn config_missing_display() {
        let err = ProbtraderError::ConfigMissing {
            section: "params".into(),
            key: "buy_on_dip".into(),
        };
        assert_eq!(err.to_string(), "missing config key [params] buy_on_dip");
    }

    #[test]
    fn invalid_param_uses_params_section() {
        let err = ProbtraderError::invalid_param("risk_percent", "must be in (0, 1]");
        match err {
            ProbtraderError::ConfigInvalid { section, key, .. } => {
                assert_eq!(section, "params");
                assert_eq!(key, "risk_percent");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ProbtraderError = io.into();
        assert!(matches!(err, ProbtraderError::Io(_)));
    }
}
