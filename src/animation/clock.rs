//! Drift-free playback clock.
//!
//! A [`PlaybackInstance`] never accumulates frame deltas. It stores a single
//! `start_reference` timestamp and derives `elapsed = now - start_reference`
//! on demand. The reference is written exactly twice in an instance's life
//! cycle: once by [`PlaybackInstance::start`] and once per
//! [`PlaybackInstance::resume`], where it is rewritten as
//! `now - paused_at_elapsed` so that elapsed time continues from the frozen
//! value with zero drift. Looping is a pure modulo of the ever-growing elapsed
//! time (see [`effective_track_time`]); it never touches the reference.
//!
//! All arithmetic is done on [`Duration`] (integer nanoseconds), which makes
//! pause/resume and loop wraparound exact.
//!
//! State machine: `Created → Playing ⇄ Paused → Stopped`.

use std::fmt;
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::animation::error::EngineError;
use crate::components::track::TrackId;

/// Host clock reading, measured from an arbitrary host epoch.
pub type Timestamp = Duration;

/// Identifier of a playing animation instance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Created,
    Playing,
    Paused,
    /// Terminal.
    Stopped,
}

/// Elapsed time frozen by `pause` (or `stop`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PauseState {
    pub paused_at_elapsed: Duration,
}

/// Loop behavior copied from the animation definition.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlaybackTiming {
    pub duration: Duration,
    pub looping: bool,
    pub ping_pong: bool,
}

/// Where a single track is on its own timeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackTime {
    /// Phase offset not reached yet; the track must not be evaluated.
    Pending,
    /// Normalized time inside `[0, duration]`.
    At(Duration),
    /// Non-looping track that reached its duration.
    Finished,
}

impl TrackTime {
    pub fn time(self) -> Option<Duration> {
        match self {
            TrackTime::At(t) => Some(t),
            TrackTime::Pending | TrackTime::Finished => None,
        }
    }
}

/// Mutable playback state of one animation applied to a set of tracks.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackInstance {
    pub id: InstanceId,
    pub animation_id: String,
    pub track_ids: SmallVec<[TrackId; 8]>,
    state: PlaybackState,
    start_reference: Option<Timestamp>,
    pause_state: Option<PauseState>,
    loop_count: u32,
}

impl PlaybackInstance {
    pub fn new(
        id: InstanceId,
        animation_id: impl Into<String>,
        track_ids: impl IntoIterator<Item = TrackId>,
    ) -> Self {
        PlaybackInstance {
            id,
            animation_id: animation_id.into(),
            track_ids: track_ids.into_iter().collect(),
            state: PlaybackState::Created,
            start_reference: None,
            pause_state: None,
            loop_count: 0,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn start_reference(&self) -> Option<Timestamp> {
        self.start_reference
    }

    pub fn pause_state(&self) -> Option<PauseState> {
        self.pause_state
    }

    pub fn loop_count(&self) -> u32 {
        self.loop_count
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    fn invalid(&self, operation: &'static str) -> EngineError {
        EngineError::InvalidState {
            instance: self.id,
            operation,
            state: self.state,
        }
    }

    /// Begin playback at `now`.
    pub fn start(&mut self, now: Timestamp) -> Result<(), EngineError> {
        if self.state != PlaybackState::Created {
            return Err(self.invalid("start"));
        }
        self.start_reference = Some(now);
        self.pause_state = None;
        self.loop_count = 0;
        self.state = PlaybackState::Playing;
        debug!("{} started at {:?}", self.id, now);
        Ok(())
    }

    /// Freeze elapsed time. `now` must be the tick timestamp, not a fresh
    /// clock read. Pausing an already paused instance is a no-op.
    pub fn pause(&mut self, now: Timestamp) -> Result<(), EngineError> {
        match self.state {
            PlaybackState::Paused => Ok(()),
            PlaybackState::Playing => {
                let elapsed = self.elapsed(now)?;
                self.pause_state = Some(PauseState {
                    paused_at_elapsed: elapsed,
                });
                self.state = PlaybackState::Paused;
                debug!("{} paused at elapsed {:?}", self.id, elapsed);
                Ok(())
            }
            PlaybackState::Created | PlaybackState::Stopped => Err(self.invalid("pause")),
        }
    }

    /// Continue from the frozen elapsed time.
    ///
    /// Rewrites the reference as `now - paused_at_elapsed`, so
    /// `elapsed(now)` right after resuming equals the paused value exactly.
    pub fn resume(&mut self, now: Timestamp) -> Result<(), EngineError> {
        let pause = match (self.state, self.pause_state) {
            (PlaybackState::Paused, Some(pause)) => pause,
            _ => return Err(self.invalid("resume")),
        };
        self.start_reference = Some(now.saturating_sub(pause.paused_at_elapsed));
        self.pause_state = None;
        self.state = PlaybackState::Playing;
        debug!(
            "{} resumed at {:?} from elapsed {:?}",
            self.id, now, pause.paused_at_elapsed
        );
        Ok(())
    }

    /// Stop for good. Idempotent; elapsed time stays frozen afterwards.
    pub fn stop(&mut self, now: Timestamp) -> Result<(), EngineError> {
        match self.state {
            PlaybackState::Stopped => Ok(()),
            PlaybackState::Created => {
                self.state = PlaybackState::Stopped;
                Ok(())
            }
            PlaybackState::Playing | PlaybackState::Paused => {
                let elapsed = self.elapsed(now)?;
                self.pause_state = Some(PauseState {
                    paused_at_elapsed: elapsed,
                });
                self.state = PlaybackState::Stopped;
                debug!("{} stopped at elapsed {:?}", self.id, elapsed);
                Ok(())
            }
        }
    }

    /// Elapsed playback time. Grows without bound while playing and is never
    /// reset by looping.
    pub fn elapsed(&self, now: Timestamp) -> Result<Duration, EngineError> {
        if let Some(pause) = self.pause_state {
            return Ok(pause.paused_at_elapsed);
        }
        match self.start_reference {
            Some(start) => Ok(now.saturating_sub(start)),
            None => Err(EngineError::NotStarted(self.id)),
        }
    }

    /// Time of one track on its own timeline at `now`.
    pub fn track_time(
        &self,
        now: Timestamp,
        timing: PlaybackTiming,
        phase_offset: Duration,
    ) -> Result<TrackTime, EngineError> {
        let elapsed = self.elapsed(now)?;
        Ok(effective_track_time(elapsed, timing, phase_offset))
    }

    /// Raise the diagnostic loop counter. Returns `true` when it changed.
    pub fn record_loop(&mut self, count: u32) -> bool {
        if count > self.loop_count {
            self.loop_count = count;
            true
        } else {
            false
        }
    }
}

/// Map instance elapsed time to a track's normalized time.
///
/// 1. `track_elapsed = elapsed - phase_offset`; negative means [`TrackTime::Pending`].
/// 2. Non-looping: [`TrackTime::Finished`] once `track_elapsed >= duration`.
/// 3. Looping: `track_elapsed mod duration`.
/// 4. Ping-pong: odd cycles play reversed (`duration - within`).
pub fn effective_track_time(
    elapsed: Duration,
    timing: PlaybackTiming,
    phase_offset: Duration,
) -> TrackTime {
    let Some(track_elapsed) = elapsed.checked_sub(phase_offset) else {
        return TrackTime::Pending;
    };
    let duration = timing.duration.as_nanos();
    if duration == 0 {
        return TrackTime::Finished;
    }
    let nanos = track_elapsed.as_nanos();

    if !timing.looping {
        return if nanos >= duration {
            TrackTime::Finished
        } else {
            TrackTime::At(track_elapsed)
        };
    }

    let within = nanos % duration;
    if timing.ping_pong && (nanos / duration) % 2 == 1 {
        TrackTime::At(nanos_to_duration(duration - within))
    } else {
        TrackTime::At(nanos_to_duration(within))
    }
}

/// Number of completed cycles of a looping track.
pub fn completed_cycles(elapsed: Duration, duration: Duration, phase_offset: Duration) -> u32 {
    match elapsed.checked_sub(phase_offset) {
        Some(track_elapsed) if !duration.is_zero() => {
            u32::try_from(track_elapsed.as_nanos() / duration.as_nanos()).unwrap_or(u32::MAX)
        }
        _ => 0,
    }
}

fn nanos_to_duration(nanos: u128) -> Duration {
    // `nanos` is always below the definition duration, which fits in a Duration.
    Duration::new(
        (nanos / 1_000_000_000) as u64,
        (nanos % 1_000_000_000) as u32,
    )
}
