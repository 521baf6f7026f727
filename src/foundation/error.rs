pub type DriftResult<T> = Result<T, DriftError>;

#[derive(thiserror::Error, Debug)]
pub enum DriftError {
    /// Unreadable/missing source image, zero-area image, mismatched input grids.
    #[error("input error: {0}")]
    Input(String),

    /// Raw depth grid is empty, non-finite, or has no usable range.
    #[error("degenerate depth error: {0}")]
    Depth(String),

    /// Internal contract violation (bad parameters, dimension mismatch mid-pipeline).
    #[error("validation error: {0}")]
    Validation(String),

    /// Failure while delivering a frame to the external video sink.
    #[error("sink error: {0}")]
    Sink(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DriftError {
    pub fn input(msg: impl Into<String>) -> Self {
        Self::Input(msg.into())
    }

    pub fn depth(msg: impl Into<String>) -> Self {
        Self::Depth(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(DriftError::input("x").to_string().contains("input error:"));
        assert!(
            DriftError::depth("x")
                .to_string()
                .contains("degenerate depth error:")
        );
        assert!(
            DriftError::validation("x")
                .to_string()
                .contains("validation error:")
        );
        assert!(DriftError::sink("x").to_string().contains("sink error:"));
    }

    #[test]
    fn other_preserves_source() {
        let base = std::io::Error::other("boom");
        let err = DriftError::Other(anyhow::Error::new(base));
        assert!(err.to_string().contains("boom"));
    }
}
