//! Keeps [`ResolvedCache`] in sync with instances, definitions and tracks.
//!
//! An instance is re-resolved only when its [`Fingerprint`] is stale:
//! - the definition was replaced in the [`AnimationLibrary`],
//! - its strategy was replaced through `PlaybackTable::set_strategy`,
//! - one of its bound [`Track`]s appeared, disappeared or got a new initial
//!   position.
//!
//! Track edits elsewhere in the world only trigger a comparison of the bound
//! track list, never a resolution.
//!
//! [`CurrentPosition`] is read into the snapshots but changing it never
//! invalidates anything.

use std::hash::{Hash, Hasher};

use bevy_ecs::prelude::*;
use log::{debug, info, warn};
use rustc_hash::{FxHashMap, FxHasher};

use crate::animation::clock::PlaybackState;
use crate::animation::error::EngineError;
use crate::animation::strategy::resolve;
use crate::components::track::{CurrentPosition, Track, TrackId, TrackSnapshot};
use crate::resources::animationlibrary::AnimationLibrary;
use crate::resources::integrationstates::IntegrationStates;
use crate::resources::playbacktable::PlaybackTable;
use crate::resources::resolvedcache::{Fingerprint, ResolvedCache, ResolvedEntry};

pub fn refresh_resolved_tracks(
    table: Res<PlaybackTable>,
    library: Res<AnimationLibrary>,
    mut cache: ResMut<ResolvedCache>,
    mut states: ResMut<IntegrationStates>,
    changed: Query<(), Changed<Track>>,
    mut removed: RemovedComponents<Track>,
    tracks: Query<(&Track, Option<&CurrentPosition>)>,
) {
    let removed_any = removed.read().count() > 0;
    if removed_any || !changed.is_empty() {
        cache.bump_track_revision();
        debug!("Track set changed, revision {}", cache.track_revision());
    }

    cache.retain(|id| table.contains(id));

    let mut snapshots: Option<FxHashMap<TrackId, TrackSnapshot>> = None;

    for id in table.ids() {
        let Some(entry) = table.get(id) else {
            continue;
        };
        if entry.instance.state() == PlaybackState::Stopped {
            continue;
        }
        let Some(definition_revision) = library.revision(&entry.instance.animation_id) else {
            if cache.remove(id).is_some() {
                warn!(
                    "Animation '{}' of {} left the library",
                    entry.instance.animation_id, id
                );
            }
            continue;
        };
        let track_revision = cache.track_revision();
        let revisions = Fingerprint {
            definition_revision,
            strategy_revision: entry.strategy_revision,
            tracks: 0,
        };
        let cached = cache
            .get(id)
            .filter(|cached| cached.fingerprint.same_revisions(&revisions));
        if cached.is_some_and(|cached| cached.checked_at == track_revision) {
            continue;
        }

        let by_id = snapshots.get_or_insert_with(|| {
            tracks
                .iter()
                .map(|(track, current)| (track.id, TrackSnapshot::from_components(track, current)))
                .collect()
        });
        let mut bound = Vec::with_capacity(entry.instance.track_ids.len());
        for track_id in &entry.instance.track_ids {
            match by_id.get(track_id) {
                Some(snapshot) => bound.push(*snapshot),
                None => warn!("{}: track {} does not exist, skipped", id, track_id),
            }
        }
        let fingerprint = Fingerprint {
            tracks: bound_tracks_hash(&bound),
            ..revisions
        };
        if cache.is_fresh(id, fingerprint) {
            cache.mark_checked(id, track_revision);
            continue;
        }

        let resolved = library
            .definition(&entry.instance.animation_id)
            .and_then(|definition| {
                resolve(&definition, &bound, &entry.strategy)
                    .map(|resolution| (definition, resolution))
            });
        match resolved {
            Ok((definition, resolution)) => {
                for notice in &resolution.notices {
                    match notice {
                        EngineError::MissingCenterDefaultedToAuto => info!("{}: {}", id, notice),
                        _ if notice.is_notice() => debug!("{}: {}", id, notice),
                        _ => warn!("{}: {}", id, notice),
                    }
                }
                states.clear_instance(id);
                cache.store(
                    id,
                    ResolvedEntry {
                        fingerprint,
                        checked_at: track_revision,
                        definition,
                        resolution,
                    },
                );
            }
            Err(e) => {
                warn!("{}: resolution failed: {}", id, e);
                cache.remove(id);
            }
        }
    }
}

/// Hash of the identity and initial position of the bound tracks, in order.
fn bound_tracks_hash(bound: &[TrackSnapshot]) -> u64 {
    let mut hasher = FxHasher::default();
    bound.len().hash(&mut hasher);
    for snapshot in bound {
        snapshot.id.hash(&mut hasher);
        for component in snapshot.initial_position.to_array() {
            component.to_bits().hash(&mut hasher);
        }
    }
    hasher.finish()
}
