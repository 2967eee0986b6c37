//! Error taxonomy of the playback engine.
//!
//! Structural errors ([`EngineError::InvalidDefinition`],
//! [`EngineError::InvalidStrategy`]) are raised at configuration time, before
//! any playback instance exists. Runtime errors raised while ticking are
//! caught per track by the tick engine and reported instead of propagated.

use thiserror::Error;

use crate::animation::clock::{InstanceId, PlaybackState};
use crate::components::track::TrackId;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A clock operation was requested from a state that does not allow it
    /// (resume without pause, pause on a stopped instance, ...).
    #[error("instance {instance}: cannot {operation} while {state:?}")]
    InvalidState {
        instance: InstanceId,
        operation: &'static str,
        state: PlaybackState,
    },

    /// The clock was queried before `start`.
    #[error("instance {0} has not been started")]
    NotStarted(InstanceId),

    /// A model was evaluated with an incomplete parameter set. Recovered
    /// locally by substituting the model default.
    #[error("{model}: missing or invalid parameter '{key}'")]
    MissingParameter { model: &'static str, key: String },

    /// `UserCenter` formation without a custom center; the resolver used the
    /// arithmetic mean of the tracks instead.
    #[error("formation center missing, defaulted to the track barycenter")]
    MissingCenterDefaultedToAuto,

    #[error("invalid animation definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid multi-track strategy: {0}")]
    InvalidStrategy(String),

    #[error("unknown animation '{0}'")]
    UnknownAnimation(String),

    #[error("unknown playback instance {0}")]
    UnknownInstance(InstanceId),

    #[error("track {track}: evaluated position is not finite")]
    NonFinitePosition { track: TrackId },
}

impl EngineError {
    /// Notices are recoverable and do not abort the operation that raised them.
    pub fn is_notice(&self) -> bool {
        matches!(
            self,
            EngineError::MissingCenterDefaultedToAuto | EngineError::MissingParameter { .. }
        )
    }
}
