//! Multi-track strategy resolver.
//!
//! [`resolve`] turns one [`AnimationDefinition`] applied to a set of tracks
//! into one [`ResolvedTrackParameters`] per track:
//!
//! - **Independent**: the path is relocated onto every track's own initial
//!   position (`value := anchor + (value - template_origin)` for every
//!   position-bearing parameter), then explicit per-track overrides are
//!   applied.
//! - **Formation**: the path describes a virtual formation center. Each track
//!   follows `center_path(t) + offset_i`, with `offset_i` chosen by the
//!   [`FormationVariant`].
//!
//! Offsets are derived from [`TrackSnapshot::initial_position`] only and are
//! computed once per resolution. The live position of a track never enters
//! this module.

use std::f64::consts::TAU;
use std::time::Duration;

use glam::DVec3;
use log::debug;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::definition::{AnimationDefinition, MotionType, ParamValue, ParameterSet};
use crate::animation::error::EngineError;
use crate::animation::models::{self, OriginKey};
use crate::components::track::{TrackId, TrackSnapshot};

/// Placement function of the `Custom` formation variant.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Arrangement {
    /// Evenly spread on a horizontal circle around the center.
    Circle { radius: f64 },
    /// Evenly spaced along `direction`, centered on the formation center.
    Line { spacing: f64, direction: DVec3 },
}

impl Arrangement {
    fn validate(&self) -> Result<(), EngineError> {
        match *self {
            Arrangement::Circle { radius } if !(radius.is_finite() && radius >= 0.0) => Err(
                EngineError::InvalidStrategy(format!("circle radius must be >= 0, got {radius}")),
            ),
            Arrangement::Line { spacing, .. } if !(spacing.is_finite() && spacing >= 0.0) => Err(
                EngineError::InvalidStrategy(format!("line spacing must be >= 0, got {spacing}")),
            ),
            Arrangement::Line { direction, .. } if !direction.is_finite() => Err(
                EngineError::InvalidStrategy("line direction is not finite".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Offset of the `index`-th of `count` tracks.
    pub fn offset(&self, index: usize, count: usize) -> DVec3 {
        let count = count.max(1);
        match *self {
            Arrangement::Circle { radius } => {
                let angle = TAU * index as f64 / count as f64;
                DVec3::new(radius * angle.cos(), radius * angle.sin(), 0.0)
            }
            Arrangement::Line { spacing, direction } => {
                let dir = direction.try_normalize().unwrap_or(DVec3::X);
                let centered = index as f64 - (count - 1) as f64 / 2.0;
                dir * (spacing * centered)
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FormationVariant {
    /// Every track follows the authored path itself.
    Shared,
    /// Rigid formation around the barycenter of the initial positions.
    AutoCenter,
    /// Formation around a user-supplied center.
    UserCenter,
    /// Tracks placed by an explicit arrangement around the center.
    Custom(Arrangement),
}

fn default_true() -> bool {
    true
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MultiTrackMode {
    Independent,
    Formation {
        variant: FormationVariant,
        #[serde(default)]
        custom_center: Option<DVec3>,
        #[serde(default = "default_true")]
        preserve_offsets: bool,
    },
}

/// How one animation is spread over several tracks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyConfig {
    pub mode: MultiTrackMode,
    /// Start of track `i` is delayed by `i * phase_offset_seconds`.
    #[serde(default)]
    pub phase_offset_seconds: f64,
    /// User-assigned delays, replacing the index stagger for these tracks.
    #[serde(default)]
    pub track_phase_offsets: FxHashMap<TrackId, f64>,
    /// Parameter values the user modified for a single track.
    #[serde(default)]
    pub track_overrides: FxHashMap<TrackId, ParameterSet>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        StrategyConfig::independent()
    }
}

impl StrategyConfig {
    pub fn independent() -> Self {
        StrategyConfig {
            mode: MultiTrackMode::Independent,
            phase_offset_seconds: 0.0,
            track_phase_offsets: FxHashMap::default(),
            track_overrides: FxHashMap::default(),
        }
    }

    pub fn formation(variant: FormationVariant) -> Self {
        StrategyConfig {
            mode: MultiTrackMode::Formation {
                variant,
                custom_center: None,
                preserve_offsets: true,
            },
            ..StrategyConfig::independent()
        }
    }

    pub fn with_center(mut self, center: DVec3) -> Self {
        if let MultiTrackMode::Formation { custom_center, .. } = &mut self.mode {
            *custom_center = Some(center);
        }
        self
    }

    pub fn with_preserve_offsets(mut self, preserve: bool) -> Self {
        if let MultiTrackMode::Formation {
            preserve_offsets, ..
        } = &mut self.mode
        {
            *preserve_offsets = preserve;
        }
        self
    }

    pub fn with_phase_offset(mut self, seconds: f64) -> Self {
        self.phase_offset_seconds = seconds;
        self
    }

    pub fn with_track_phase(mut self, track: TrackId, seconds: f64) -> Self {
        self.track_phase_offsets.insert(track, seconds);
        self
    }

    pub fn with_override(mut self, track: TrackId, key: &str, value: impl Into<ParamValue>) -> Self {
        self.track_overrides.entry(track).or_default().insert(key, value);
        self
    }

    pub fn is_formation(&self) -> bool {
        matches!(self.mode, MultiTrackMode::Formation { .. })
    }

    /// Structural validation, run before any instance uses the config.
    pub fn validate(&self) -> Result<(), EngineError> {
        let offset_ok = |s: f64| s.is_finite() && s >= 0.0;
        if !offset_ok(self.phase_offset_seconds) {
            return Err(EngineError::InvalidStrategy(format!(
                "phase offset must be >= 0, got {}",
                self.phase_offset_seconds
            )));
        }
        for (track, seconds) in &self.track_phase_offsets {
            if !offset_ok(*seconds) {
                return Err(EngineError::InvalidStrategy(format!(
                    "phase offset of track {track} must be >= 0, got {seconds}"
                )));
            }
        }
        for (track, params) in &self.track_overrides {
            if let Some(key) = params.first_non_finite() {
                return Err(EngineError::InvalidStrategy(format!(
                    "override '{key}' of track {track} is not finite"
                )));
            }
        }
        if let MultiTrackMode::Formation {
            variant,
            custom_center,
            ..
        } = &self.mode
        {
            if custom_center.is_some_and(|c| !c.is_finite()) {
                return Err(EngineError::InvalidStrategy(
                    "custom center is not finite".into(),
                ));
            }
            if let FormationVariant::Custom(arrangement) = variant {
                arrangement.validate()?;
            }
        }
        Ok(())
    }

    fn phase_offset(&self, track: TrackId, index: usize) -> Duration {
        let seconds = self
            .track_phase_offsets
            .get(&track)
            .copied()
            .unwrap_or(index as f64 * self.phase_offset_seconds);
        Duration::try_from_secs_f64(seconds).unwrap_or(Duration::ZERO)
    }
}

/// Per-track input of the motion evaluator.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedTrackParameters {
    pub track_id: TrackId,
    pub index: usize,
    /// Complete parameter set, relocated for this track (Independent) or for
    /// the formation center (Formation).
    pub parameters: ParameterSet,
    /// Origin the path was relocated to.
    pub anchor: DVec3,
    /// Added to the evaluated path position.
    pub offset: DVec3,
    pub phase_offset: Duration,
}

impl ResolvedTrackParameters {
    pub fn place(&self, path_position: DVec3) -> DVec3 {
        path_position + self.offset
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub tracks: Vec<ResolvedTrackParameters>,
    /// Recoverable notices raised while resolving.
    pub notices: Vec<EngineError>,
}

impl Resolution {
    pub fn get(&self, track: TrackId) -> Option<&ResolvedTrackParameters> {
        self.tracks.iter().find(|r| r.track_id == track)
    }
}

/// Authored parameters completed with the model defaults.
///
/// Defaults are laid out around the authored origin, or the world origin when
/// the definition does not set one.
pub fn template_parameters(definition: &AnimationDefinition) -> ParameterSet {
    let motion = definition.motion_type;
    let authored_origin = models::origin(motion, &definition.parameters).unwrap_or(DVec3::ZERO);
    definition
        .parameters
        .merged_over(&models::default_parameters(motion, authored_origin))
}

/// Translate every position-bearing parameter so the path origin lands on
/// `anchor`, keeping all deltas relative to the origin.
pub fn relocate(motion: MotionType, params: &ParameterSet, anchor: DVec3) -> ParameterSet {
    let Some(origin) = models::origin(motion, params) else {
        return params.clone();
    };
    let mut out = params.clone();
    for key in models::position_keys(motion) {
        match params.get(key) {
            Some(ParamValue::Vec3(v)) => out.insert(key, anchor + (*v - origin)),
            Some(ParamValue::Points(points)) => out.insert(
                key,
                points
                    .iter()
                    .map(|p| anchor + (*p - origin))
                    .collect::<Vec<_>>(),
            ),
            _ => {}
        }
    }
    // exact, not anchor + (origin - origin)
    match models::origin_key(motion) {
        OriginKey::Point(key) => out.insert(key, anchor),
        OriginKey::FirstOf(key) => {
            if let Some(mut points) = out.points(key).map(<[DVec3]>::to_vec) {
                if let Some(first) = points.first_mut() {
                    *first = anchor;
                }
                out.insert(key, points);
            }
        }
    }
    out
}

/// How a formation variant places a track relative to the center path.
enum OffsetRule {
    Zero,
    /// `initial_position - center`
    RelativeTo(DVec3),
    Arranged(Arrangement),
}

impl OffsetRule {
    fn offset(&self, index: usize, count: usize, track: &TrackSnapshot) -> DVec3 {
        match self {
            OffsetRule::Zero => DVec3::ZERO,
            OffsetRule::RelativeTo(center) => track.initial_position - *center,
            OffsetRule::Arranged(arrangement) => arrangement.offset(index, count),
        }
    }
}

fn barycenter(tracks: &[TrackSnapshot]) -> DVec3 {
    let sum: DVec3 = tracks.iter().map(|t| t.initial_position).sum();
    sum / tracks.len() as f64
}

/// Resolve per-track parameters for `tracks` (in index order).
pub fn resolve(
    definition: &AnimationDefinition,
    tracks: &[TrackSnapshot],
    config: &StrategyConfig,
) -> Result<Resolution, EngineError> {
    config.validate()?;
    if tracks.is_empty() {
        return Ok(Resolution::default());
    }
    let motion = definition.motion_type;
    let template = template_parameters(definition);

    let resolution = match config.mode {
        MultiTrackMode::Independent => resolve_independent(motion, &template, tracks, config),
        MultiTrackMode::Formation {
            variant,
            custom_center,
            preserve_offsets,
        } => {
            if !config.track_overrides.is_empty() {
                debug!(
                    "'{}': per-track overrides ignored in formation mode",
                    definition.id
                );
            }
            resolve_formation(
                motion,
                &template,
                tracks,
                config,
                variant,
                custom_center,
                preserve_offsets,
            )
        }
    };
    debug!(
        "resolved '{}' ({}) for {} track(s), {} notice(s)",
        definition.id,
        motion,
        resolution.tracks.len(),
        resolution.notices.len()
    );
    Ok(resolution)
}

fn resolve_independent(
    motion: MotionType,
    template: &ParameterSet,
    tracks: &[TrackSnapshot],
    config: &StrategyConfig,
) -> Resolution {
    let tracks = tracks
        .iter()
        .enumerate()
        .map(|(index, track)| {
            let anchor = track.initial_position;
            let mut parameters = relocate(motion, template, anchor);
            if let Some(overrides) = config.track_overrides.get(&track.id) {
                for (key, value) in overrides.iter() {
                    // an override equal to the template value is not a user edit
                    if template.get(key) != Some(value) {
                        parameters.insert(key, value.clone());
                    }
                }
            }
            ResolvedTrackParameters {
                track_id: track.id,
                index,
                parameters,
                anchor,
                offset: DVec3::ZERO,
                phase_offset: config.phase_offset(track.id, index),
            }
        })
        .collect();
    Resolution {
        tracks,
        notices: Vec::new(),
    }
}

fn resolve_formation(
    motion: MotionType,
    template: &ParameterSet,
    tracks: &[TrackSnapshot],
    config: &StrategyConfig,
    variant: FormationVariant,
    custom_center: Option<DVec3>,
    preserve_offsets: bool,
) -> Resolution {
    let mut notices = Vec::new();
    let count = tracks.len();
    let mean = barycenter(tracks);

    let (center, rule) = match variant {
        FormationVariant::Shared => (None, OffsetRule::Zero),
        FormationVariant::AutoCenter => (Some(mean), OffsetRule::RelativeTo(mean)),
        FormationVariant::UserCenter => match custom_center {
            Some(center) if preserve_offsets => (Some(center), OffsetRule::RelativeTo(center)),
            Some(center) => (Some(center), OffsetRule::Zero),
            None => {
                notices.push(EngineError::MissingCenterDefaultedToAuto);
                (Some(mean), OffsetRule::RelativeTo(mean))
            }
        },
        FormationVariant::Custom(arrangement) => {
            let center = custom_center.unwrap_or(mean);
            if preserve_offsets {
                (Some(center), OffsetRule::Arranged(arrangement))
            } else {
                (Some(center), OffsetRule::Zero)
            }
        }
    };

    let (parameters, anchor) = match center {
        Some(center) => (relocate(motion, template, center), center),
        None => (
            template.clone(),
            models::origin(motion, template).unwrap_or(DVec3::ZERO),
        ),
    };

    let tracks = tracks
        .iter()
        .enumerate()
        .map(|(index, track)| ResolvedTrackParameters {
            track_id: track.id,
            index,
            parameters: parameters.clone(),
            anchor,
            offset: rule.offset(index, count, track),
            phase_offset: config.phase_offset(track.id, index),
        })
        .collect();
    Resolution { tracks, notices }
}
