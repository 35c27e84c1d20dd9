use strum::Display;
use thiserror::Error;

use crate::layout_engine::scratchpad::ScratchpadError;
use crate::model::WorkspaceError;
use crate::sys::spawn::SpawnError;
use crate::sys::surface::WindowId;

/// What an out-of-range index referred to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum IndexTarget {
    Workspace,
    Monitor,
    Tab,
}

/// A rejected request. Nothing changed when one of these is returned, except
/// that a failed scratchpad spawn leaves the scratchpad absent.
#[derive(Debug, Error)]
pub enum ReactorError {
    #[error("{target} index {index} out of range (have {len})")]
    InvalidIndex {
        target: IndexTarget,
        index: usize,
        len: usize,
    },
    #[error("no scratchpad named {0:?}")]
    UnmatchedScratchpad(String),
    #[error("unknown layout {0:?}")]
    UnknownLayout(String),
    #[error("window {0} is not managed")]
    UnknownWindow(WindowId),
    #[error("scratchpad {identifier:?} failed to spawn")]
    Spawn {
        identifier: String,
        #[source]
        source: SpawnError,
    },
}

impl From<WorkspaceError> for ReactorError {
    fn from(e: WorkspaceError) -> Self {
        match e {
            WorkspaceError::InvalidIndex { index, len } => ReactorError::InvalidIndex {
                target: IndexTarget::Workspace,
                index,
                len,
            },
            WorkspaceError::UnknownWindow(id) => ReactorError::UnknownWindow(id),
            WorkspaceError::UnknownLayout(name) => ReactorError::UnknownLayout(name),
        }
    }
}

impl From<ScratchpadError> for ReactorError {
    fn from(e: ScratchpadError) -> Self {
        match e {
            ScratchpadError::Unmatched(id) => ReactorError::UnmatchedScratchpad(id),
            ScratchpadError::Spawn { identifier, source } => ReactorError::Spawn { identifier, source },
        }
    }
}
