use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Failure taxonomy for the rendering core.
///
/// Recoverable cases (`InvalidHandle` where the documented policy allows,
/// `UnrecognizedInput`) degrade the frame instead of aborting it.
/// `IllegalState` marks a pipeline bug and is always surfaced; continuing
/// past one risks corrupting recorded GPU state.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Handle is empty, already released, or was never issued for the
    /// expected resource kind.
    #[error("invalid {kind} handle")]
    InvalidHandle { kind: &'static str },

    /// Command-list or pipeline operation out of order.
    #[error("illegal state: {0}")]
    IllegalState(&'static str),

    /// Backend could not allocate or grow a resource. The triggering call
    /// leaves no partial side effects behind.
    #[error("resource exhaustion: {what} ({requested} bytes requested)")]
    ResourceExhaustion { what: &'static str, requested: usize },

    /// Input referenced something the pipeline does not know. Reported for
    /// diagnostics; the offending draw is skipped and the frame continues.
    #[error("unrecognized input: {what}")]
    UnrecognizedInput { what: String },
}

impl RenderError {
    pub(crate) fn invalid_handle<T>() -> Self {
        let name = std::any::type_name::<T>();
        RenderError::InvalidHandle {
            kind: name.rsplit("::").next().unwrap_or(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::Texture;

    #[test]
    fn invalid_handle_names_the_kind() {
        let err = RenderError::invalid_handle::<Texture>();
        assert_eq!(err.to_string(), "invalid Texture handle");
    }
}
