//! Conversions into [`BlueprintError`].

use super::BlueprintError;
use crate::walker::WalkError;

impl From<WalkError> for BlueprintError {
    fn from(err: WalkError) -> Self {
        match err {
            WalkError::OutsideRoot { start, end } => Self::InvalidWalk { start, end },
            WalkError::Io { path, source } => Self::Io { path, source },
            WalkError::Callback(source) => Self::Walk { source },
            WalkError::Stop => Self::Walk {
                source: "walk stopped outside of a walker".into(),
            },
        }
    }
}
