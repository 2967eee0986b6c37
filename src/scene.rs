//! JSON scene files.
//!
//! A scene bundles animation definitions, the tracks they act on and the
//! playbacks to create when the scene is applied:
//!
//! ```json
//! {
//!   "animations": [
//!     { "id": "orbit", "type": "circular", "duration": 8.0, "loop": true,
//!       "parameters": { "radius": 4.0 } }
//!   ],
//!   "tracks": [
//!     { "id": 1, "name": "Vocals", "position": [0.0, 2.0, 0.0] },
//!     { "id": 2, "name": "Pad", "aed": { "azimuth": 90.0, "elevation": 0.0, "distance": 3.0 } }
//!   ],
//!   "playbacks": [
//!     { "animation": "orbit", "tracks": [1, 2],
//!       "strategy": { "mode": { "formation": { "variant": "autoCenter" } } } }
//!   ]
//! }
//! ```
//!
//! Track positions are given in the domain convention (Z up), either as a
//! vector or as azimuth/elevation/distance.
//!
//! A playback selects its tracks with a list of ids or a [`TrackSelection`]
//! pattern: `"[1-4]"` for an inclusive id range, `"{1, Pad, 7}"` for a set
//! of ids or track names.

use std::path::Path;

use bevy_ecs::prelude::*;
use glam::DVec3;
use log::info;
use serde::{Deserialize, Serialize};

use crate::animation::coords::{Aed, from_aed};
use crate::animation::definition::{AnimationDefinition, MotionType, ParameterSet};
use crate::animation::strategy::{Arrangement, FormationVariant, StrategyConfig};
use crate::components::track::{CurrentPosition, Track, TrackId};
use crate::events::playback::PlaybackCommand;
use crate::resources::animationlibrary::AnimationLibrary;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneTrack {
    pub id: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub position: Option<DVec3>,
    #[serde(default)]
    pub aed: Option<Aed>,
}

impl SceneTrack {
    /// `position` wins over `aed`; a track with neither sits at the origin.
    pub fn initial_position(&self) -> DVec3 {
        match (self.position, self.aed) {
            (Some(position), _) => position,
            (None, Some(aed)) => from_aed(aed.azimuth, aed.elevation, aed.distance),
            (None, None) => DVec3::ZERO,
        }
    }
}

/// Tracks a scene playback acts on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrackSelection {
    Ids(Vec<TrackId>),
    Pattern(String),
}

impl From<Vec<TrackId>> for TrackSelection {
    fn from(ids: Vec<TrackId>) -> Self {
        TrackSelection::Ids(ids)
    }
}

impl TrackSelection {
    /// Track ids in selection order. Names in a set pattern are looked up in
    /// `tracks`.
    pub fn resolve(&self, tracks: &[SceneTrack]) -> Result<Vec<TrackId>, String> {
        match self {
            TrackSelection::Ids(ids) => Ok(ids.clone()),
            TrackSelection::Pattern(pattern) => parse_pattern(pattern, tracks),
        }
    }
}

/// Parse `[start-end]` or `{a,b,...}`.
pub fn parse_pattern(pattern: &str, tracks: &[SceneTrack]) -> Result<Vec<TrackId>, String> {
    let pattern = pattern.trim();
    if let Some(range) = pattern.strip_prefix('[').and_then(|p| p.strip_suffix(']')) {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| format!("Invalid range '{}'", pattern))?;
        let start: u32 = start
            .trim()
            .parse()
            .map_err(|_| format!("Invalid range start in '{}'", pattern))?;
        let end: u32 = end
            .trim()
            .parse()
            .map_err(|_| format!("Invalid range end in '{}'", pattern))?;
        if start > end {
            return Err(format!("Empty range '{}'", pattern));
        }
        Ok((start..=end).map(TrackId).collect())
    } else if let Some(set) = pattern.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
        set.split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| match item.parse::<u32>() {
                Ok(id) => Ok(TrackId(id)),
                Err(_) => tracks
                    .iter()
                    .find(|t| t.name == item)
                    .map(|t| TrackId(t.id))
                    .ok_or_else(|| format!("Unknown track '{}' in '{}'", item, pattern)),
            })
            .collect()
    } else {
        Err(format!("Invalid track pattern '{}'", pattern))
    }
}

fn default_autostart() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenePlayback {
    pub animation: String,
    pub tracks: TrackSelection,
    #[serde(default)]
    pub strategy: StrategyConfig,
    #[serde(default = "default_autostart")]
    pub autostart: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub animations: Vec<AnimationDefinition>,
    #[serde(default)]
    pub tracks: Vec<SceneTrack>,
    #[serde(default)]
    pub playbacks: Vec<ScenePlayback>,
}

impl Scene {
    pub fn from_json(json: &str) -> Result<Scene, String> {
        serde_json::from_str(json).map_err(|e| format!("Failed to parse scene: {}", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Scene, String> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read scene {:?}: {}", path, e))?;
        Self::from_json(&json)
    }

    /// Built-in scene: four tracks on a square, orbiting as a rigid
    /// formation, plus a bouncing track and a lead vocal wandering on its own.
    pub fn demo() -> Scene {
        let mut animations = Vec::new();
        if let Ok(orbit) = AnimationDefinition::new("orbit", MotionType::Circular, 8.0) {
            animations.push(
                orbit
                    .with_name("Slow orbit")
                    .with_loop(true)
                    .with_parameter("radius", 4.0),
            );
        }
        if let Ok(drop) = AnimationDefinition::new("drop", MotionType::Bounce, 4.0) {
            animations.push(drop.with_name("Drop").with_parameters(
                ParameterSet::new()
                    .with("startHeight", 4.0)
                    .with("restitution", 0.6),
            ));
        }
        if let Ok(wander) = AnimationDefinition::new("wander", MotionType::PerlinNoise, 12.0) {
            animations.push(
                wander
                    .with_name("Wander")
                    .with_loop(true)
                    .with_ping_pong(true)
                    .with_parameter("bounds", DVec3::new(2.0, 2.0, 0.5)),
            );
        }

        let corner = |id: u32, name: &str, x: f64, y: f64| SceneTrack {
            id,
            name: name.into(),
            position: Some(DVec3::new(x, y, 0.0)),
            aed: None,
        };
        let tracks = vec![
            corner(1, "Drums", -2.0, 2.0),
            corner(2, "Bass", 2.0, 2.0),
            corner(3, "Keys", 2.0, -2.0),
            corner(4, "Strings", -2.0, -2.0),
            SceneTrack {
                id: 5,
                name: "Lead".into(),
                position: None,
                aed: Some(Aed {
                    azimuth: 0.0,
                    elevation: 10.0,
                    distance: 3.0,
                }),
            },
            corner(6, "FX", 0.0, 0.0),
        ];

        let playbacks = vec![
            ScenePlayback {
                animation: "orbit".into(),
                tracks: TrackSelection::Pattern("[1-4]".into()),
                strategy: StrategyConfig::formation(FormationVariant::AutoCenter),
                autostart: true,
            },
            ScenePlayback {
                animation: "wander".into(),
                tracks: vec![TrackId(5)].into(),
                strategy: StrategyConfig::independent(),
                autostart: true,
            },
            ScenePlayback {
                animation: "drop".into(),
                tracks: vec![TrackId(6)].into(),
                strategy: StrategyConfig::formation(FormationVariant::Custom(
                    Arrangement::Circle { radius: 1.0 },
                ))
                .with_phase_offset(0.5),
                autostart: true,
            },
        ];

        Scene {
            animations,
            tracks,
            playbacks,
        }
    }
}

/// Register the scene's animations, spawn its tracks and queue its
/// playbacks as [`PlaybackCommand::Create`] messages.
pub fn apply_scene(world: &mut World, scene: &Scene) -> Result<(), String> {
    let selections = scene
        .playbacks
        .iter()
        .map(|playback| playback.tracks.resolve(&scene.tracks))
        .collect::<Result<Vec<_>, _>>()?;
    {
        let mut library = world.resource_mut::<AnimationLibrary>();
        for definition in &scene.animations {
            library
                .insert(definition.clone())
                .map_err(|e| e.to_string())?;
        }
    }
    for track in &scene.tracks {
        let position = track.initial_position();
        world.spawn((
            Track::new(track.id, track.name.clone(), position),
            CurrentPosition(position),
        ));
    }
    for (playback, tracks) in scene.playbacks.iter().zip(selections) {
        world.write_message(PlaybackCommand::Create {
            animation_id: playback.animation.clone(),
            tracks,
            strategy: playback.strategy.clone(),
            autostart: playback.autostart,
        });
    }
    info!(
        "Scene applied: {} animation(s), {} track(s), {} playback(s)",
        scene.animations.len(),
        scene.tracks.len(),
        scene.playbacks.len()
    );
    Ok(())
}
