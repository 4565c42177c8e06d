//! The request pipeline as an explicit, startup-validated stage list.
//!
//! The one subtle correctness requirement in this system is middleware
//! order: identity restoration must run after the session layer exists, and
//! the current-user attachment must run after identity. Instead of relying
//! on registration order alone, the stage list is declared in one place and
//! checked before the router is built; a misordered list refuses to start.

use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// `/public/*` served from disk, outside the session stack.
    StaticAssets,
    /// Server-side session loaded from the signed cookie.
    Session,
    /// Pending flash messages drained into request scope.
    Flash,
    /// Principal restored from the session against the store.
    Identity,
    /// `CurrentUser(Option<User>)` attached to every request.
    CurrentUser,
    /// Route matching and handler execution.
    Dispatch,
    /// Fallback renderer for unmatched paths.
    NotFound,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::StaticAssets => "StaticAssets",
            Stage::Session => "Session",
            Stage::Flash => "Flash",
            Stage::Identity => "Identity",
            Stage::CurrentUser => "CurrentUser",
            Stage::Dispatch => "Dispatch",
            Stage::NotFound => "NotFound",
        };
        f.write_str(name)
    }
}

/// Pairs that must hold in declaration order: left runs before right.
const ORDERING: &[(Stage, Stage)] = &[
    (Stage::StaticAssets, Stage::Session),
    (Stage::Session, Stage::Flash),
    (Stage::Session, Stage::Identity),
    (Stage::Identity, Stage::CurrentUser),
    (Stage::CurrentUser, Stage::Dispatch),
    (Stage::Dispatch, Stage::NotFound),
];

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("pipeline stage {0} is missing")]
    Missing(Stage),
    #[error("pipeline stage {0} appears more than once")]
    Duplicate(Stage),
    #[error("pipeline stage {before} must run before stage {after}")]
    Misordered { before: Stage, after: Stage },
}

/// A validated stage list. Constructing one is the only way to get a router
/// built, so a misordered pipeline is a startup error, not a latent bug.
#[derive(Debug, Clone)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub const STANDARD: [Stage; 7] = [
        Stage::StaticAssets,
        Stage::Session,
        Stage::Flash,
        Stage::Identity,
        Stage::CurrentUser,
        Stage::Dispatch,
        Stage::NotFound,
    ];

    pub fn validate(stages: &[Stage]) -> Result<Self, PipelineError> {
        for &required in Self::STANDARD.iter() {
            match stages.iter().filter(|&&s| s == required).count() {
                0 => return Err(PipelineError::Missing(required)),
                1 => {}
                _ => return Err(PipelineError::Duplicate(required)),
            }
        }

        let position = |stage: Stage| {
            stages
                .iter()
                .position(|&s| s == stage)
                .unwrap_or(usize::MAX)
        };
        for &(before, after) in ORDERING {
            if position(before) > position(after) {
                return Err(PipelineError::Misordered { before, after });
            }
        }

        Ok(Self {
            stages: stages.to_vec(),
        })
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}
