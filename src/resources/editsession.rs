//! Single owned editing state for a multi-track animation.
//!
//! Every editable value of an apply-animation session lives in one
//! [`EditSession`] and changes only through [`EditSession::apply`]. Nothing
//! reads half-edited state: [`EditSession::commit`] validates and produces a
//! [`StrategyConfig`], and [`EditSession::create_command`] turns the session
//! into a [`PlaybackCommand::Create`].

use bevy_ecs::prelude::Resource;
use glam::DVec3;
use log::debug;
use rustc_hash::FxHashMap;

use crate::animation::definition::{ParamValue, ParameterSet};
use crate::animation::error::EngineError;
use crate::animation::strategy::{FormationVariant, MultiTrackMode, StrategyConfig};
use crate::components::track::TrackId;
use crate::events::playback::PlaybackCommand;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ModeChoice {
    #[default]
    Independent,
    Formation,
}

/// Named edits accepted by [`EditSession::apply`].
#[derive(Clone, Debug, PartialEq)]
pub enum EditAction {
    SelectAnimation(String),
    SelectTracks(Vec<TrackId>),
    SetMode(ModeChoice),
    SetVariant(FormationVariant),
    SetCustomCenter(Option<DVec3>),
    SetPreserveOffsets(bool),
    SetPhaseOffset(f64),
    SetTrackPhase(TrackId, Option<f64>),
    SetTrackOverride {
        track: TrackId,
        key: String,
        value: ParamValue,
    },
    ClearTrackOverride {
        track: TrackId,
        key: String,
    },
    /// Back to a fresh session.
    Reset,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EditSession {
    animation_id: Option<String>,
    selected_tracks: Vec<TrackId>,
    mode: ModeChoice,
    variant: FormationVariant,
    custom_center: Option<DVec3>,
    preserve_offsets: bool,
    phase_offset_seconds: f64,
    track_phase_offsets: FxHashMap<TrackId, f64>,
    track_overrides: FxHashMap<TrackId, ParameterSet>,
}

impl Default for EditSession {
    fn default() -> Self {
        EditSession {
            animation_id: None,
            selected_tracks: Vec::new(),
            mode: ModeChoice::Independent,
            variant: FormationVariant::AutoCenter,
            custom_center: None,
            preserve_offsets: true,
            phase_offset_seconds: 0.0,
            track_phase_offsets: FxHashMap::default(),
            track_overrides: FxHashMap::default(),
        }
    }
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, action: EditAction) {
        debug!("edit: {:?}", action);
        match action {
            EditAction::SelectAnimation(id) => self.animation_id = Some(id),
            EditAction::SelectTracks(mut tracks) => {
                let mut seen = Vec::with_capacity(tracks.len());
                tracks.retain(|t| {
                    let first = !seen.contains(t);
                    seen.push(*t);
                    first
                });
                self.track_phase_offsets.retain(|t, _| tracks.contains(t));
                self.track_overrides.retain(|t, _| tracks.contains(t));
                self.selected_tracks = tracks;
            }
            EditAction::SetMode(mode) => self.mode = mode,
            EditAction::SetVariant(variant) => self.variant = variant,
            EditAction::SetCustomCenter(center) => self.custom_center = center,
            EditAction::SetPreserveOffsets(preserve) => self.preserve_offsets = preserve,
            EditAction::SetPhaseOffset(seconds) => self.phase_offset_seconds = seconds,
            EditAction::SetTrackPhase(track, Some(seconds)) => {
                self.track_phase_offsets.insert(track, seconds);
            }
            EditAction::SetTrackPhase(track, None) => {
                self.track_phase_offsets.remove(&track);
            }
            EditAction::SetTrackOverride { track, key, value } => {
                self.track_overrides
                    .entry(track)
                    .or_default()
                    .insert(&key, value);
            }
            EditAction::ClearTrackOverride { track, key } => {
                if let Some(overrides) = self.track_overrides.get_mut(&track) {
                    let kept = overrides
                        .iter()
                        .filter(|(k, _)| **k != key)
                        .fold(ParameterSet::new(), |acc, (k, v)| acc.with(k, v.clone()));
                    *overrides = kept;
                    if overrides.is_empty() {
                        self.track_overrides.remove(&track);
                    }
                }
            }
            EditAction::Reset => *self = EditSession::default(),
        }
    }

    pub fn animation_id(&self) -> Option<&str> {
        self.animation_id.as_deref()
    }

    pub fn selected_tracks(&self) -> &[TrackId] {
        &self.selected_tracks
    }

    pub fn mode(&self) -> ModeChoice {
        self.mode
    }

    /// Validated strategy built from the current session.
    pub fn commit(&self) -> Result<StrategyConfig, EngineError> {
        let mode = match self.mode {
            ModeChoice::Independent => MultiTrackMode::Independent,
            ModeChoice::Formation => MultiTrackMode::Formation {
                variant: self.variant,
                custom_center: self.custom_center,
                preserve_offsets: self.preserve_offsets,
            },
        };
        let config = StrategyConfig {
            mode,
            phase_offset_seconds: self.phase_offset_seconds,
            track_phase_offsets: self.track_phase_offsets.clone(),
            track_overrides: self.track_overrides.clone(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Command creating (and optionally starting) an instance from the session.
    pub fn create_command(&self, autostart: bool) -> Result<PlaybackCommand, EngineError> {
        let animation_id = self
            .animation_id
            .clone()
            .ok_or_else(|| EngineError::InvalidStrategy("no animation selected".into()))?;
        if self.selected_tracks.is_empty() {
            return Err(EngineError::InvalidStrategy("no tracks selected".into()));
        }
        Ok(PlaybackCommand::Create {
            animation_id,
            tracks: self.selected_tracks.clone(),
            strategy: self.commit()?,
            autostart,
        })
    }
}
