use brushwork_edit::EditError;

use crate::heightmap::HeightMapError;

#[derive(Debug, thiserror::Error)]
pub enum BrushError {
    /// Bad parameter at construction; the brush is never bound.
    #[error("invalid brush configuration: {0}")]
    Configuration(String),
    /// Radius, iteration, or write budget exceeded. Nothing was written.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
    #[error("missing permission `{0}`")]
    PermissionDenied(String),
    #[error("no {0} is available for this brush")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    HeightMap(#[from] HeightMapError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
}

impl BrushError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        BrushError::Configuration(msg.into())
    }

    /// True for every error that means "too big", whoever detected it.
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            BrushError::LimitExceeded(_) | BrushError::Edit(EditError::LimitExceeded { .. })
        )
    }
}
