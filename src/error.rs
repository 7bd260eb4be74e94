use thiserror::Error;

pub type AutoencoderResult<T> = Result<T, AutoencoderError>;

#[derive(Debug, Error)]
pub enum AutoencoderError {
    #[error("Input sequence is empty")]
    EmptySequence,

    #[error("Shape mismatch at step {step}: expected {expected:?}, got {got:?}")]
    StepShapeMismatch {
        step: usize,
        expected: [usize; 2],
        got: [usize; 2],
    },

    #[error("Feature mismatch: model expects {expected} features per step, got {got}")]
    FeatureMismatch { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sequence `{item_id}` has {len} steps, {required} required")]
    ShortSequence {
        item_id: String,
        len: usize,
        required: usize,
    },

    #[error("No usable sequences in {0} set")]
    EmptyDataset(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Record error: {0}")]
    Record(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl AutoencoderError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_message() {
        let err = AutoencoderError::StepShapeMismatch {
            step: 3,
            expected: [4, 3],
            got: [4, 2],
        };
        assert_eq!(
            err.to_string(),
            "Shape mismatch at step 3: expected [4, 3], got [4, 2]"
        );
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: AutoencoderError = io.into();
        assert!(matches!(err, AutoencoderError::Io(_)));
    }
}
