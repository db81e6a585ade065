use std::sync::Arc;

use chrono::Utc;
use routesketch_shared::{MapRecord, MapSummary, MapUpdate, NewMapRecord, RecordError};
use tokio::sync::RwLock;

use crate::logic::sanitize_features;
use crate::state::{AppState, MapEntry};
use crate::storage::StorageError;

pub async fn load_maps(state: &AppState) -> Result<usize, StorageError> {
    let records = state.storage.load_all().await?;
    let mut maps = state.maps.write().await;
    for mut record in records {
        record.features = sanitize_features(record.features);
        maps.insert(record.id, Arc::new(RwLock::new(MapEntry::new(record, false))));
    }
    Ok(maps.len())
}

pub async fn list_maps(state: &AppState) -> Vec<MapSummary> {
    let entries = state.maps.read().await.values().cloned().collect::<Vec<_>>();
    let mut summaries = Vec::with_capacity(entries.len());
    for entry in entries {
        summaries.push(MapSummary::from(&entry.read().await.record));
    }
    summaries
}

pub async fn create_map(state: &AppState, input: NewMapRecord) -> Result<i64, RecordError> {
    let input = input.validate()?;
    let mut maps = state.maps.write().await;
    let id = maps.keys().next_back().map_or(1, |last| last + 1);
    let record = input.into_record(id, Utc::now());
    tracing::info!(id, name = %record.name, "created map");
    maps.insert(id, Arc::new(RwLock::new(MapEntry::new(record, true))));
    Ok(id)
}

pub async fn get_map(state: &AppState, id: i64) -> Option<MapRecord> {
    let entry = state.maps.read().await.get(&id).cloned()?;
    let record = entry.read().await.record.clone();
    Some(record)
}

pub async fn map_exists(state: &AppState, id: i64) -> bool {
    state.maps.read().await.contains_key(&id)
}

pub async fn update_map(
    state: &AppState,
    id: i64,
    mut update: MapUpdate,
) -> Result<Option<MapRecord>, RecordError> {
    let Some(entry) = state.maps.read().await.get(&id).cloned() else {
        return Ok(None);
    };
    update.features = update.features.map(sanitize_features);
    let mut entry = entry.write().await;
    update.apply(&mut entry.record)?;
    entry.dirty = true;
    tracing::debug!(id, features = entry.record.features.len(), "updated map");
    Ok(Some(entry.record.clone()))
}

pub async fn flush_dirty(state: &AppState) -> usize {
    let entries = state
        .maps
        .read()
        .await
        .iter()
        .map(|(id, entry)| (*id, entry.clone()))
        .collect::<Vec<_>>();
    let mut written = 0;
    for (id, entry) in entries {
        let maybe_record = {
            let mut entry = entry.write().await;
            if !entry.dirty {
                None
            } else {
                entry.dirty = false;
                Some(entry.record.clone())
            }
        };
        let Some(record) = maybe_record else {
            continue;
        };
        match state.storage.save(&record).await {
            Ok(()) => written += 1,
            Err(error) => {
                tracing::error!(id, error = %error, "failed to save map");
                entry.write().await.dirty = true;
            }
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use routesketch_shared::{
        Appearance, Feature, FeatureCollection, FeatureId, FeatureProperties, Geometry, LngLat,
        Stroke,
    };

    use super::*;
    use crate::storage::{FileStorage, Storage};

    fn state_in(dir: &tempfile::TempDir) -> AppState {
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path().to_path_buf()));
        AppState::new(storage, dir.path().join("index.html"))
    }

    fn new_map(name: &str) -> NewMapRecord {
        NewMapRecord {
            name: name.to_string(),
            description: Some("  ".to_string()),
            lat: 51.05,
            lng: 13.74,
        }
    }

    fn features() -> FeatureCollection {
        FeatureCollection {
            features: vec![Feature {
                id: FeatureId::new("1234567890123456"),
                geometry: Geometry::MultiLineString(vec![Stroke::new(vec![
                    LngLat::new(13.7, 51.0),
                    LngLat::new(f64::NAN, 51.0),
                ])]),
                properties: FeatureProperties {
                    appearance: Appearance {
                        color: "#000".to_string(),
                        width: 11.18,
                        opacity: 0.7,
                    },
                },
            }],
        }
    }

    #[tokio::test]
    async fn created_maps_get_increasing_ids() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert_eq!(create_map(&state, new_map("First")).await, Ok(1));
        assert_eq!(create_map(&state, new_map("  Second ")).await, Ok(2));

        let summaries = list_maps(&state).await;
        let names = summaries.iter().map(|s| s.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(summaries[0].description, None);
    }

    #[tokio::test]
    async fn invalid_input_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert_eq!(
            create_map(&state, new_map("   ")).await,
            Err(RecordError::EmptyName)
        );
        assert!(list_maps(&state).await.is_empty());
    }

    #[tokio::test]
    async fn updates_sanitize_features() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        let id = create_map(&state, new_map("Elbe")).await.unwrap();

        let updated = update_map(&state, id, MapUpdate::features(features()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.features.len(), 1);
        assert_eq!(updated.features.features[0].geometry.point_count(), 1);
        assert_eq!(get_map(&state, id).await, Some(updated));
    }

    #[tokio::test]
    async fn unknown_maps_are_reported_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        assert_eq!(update_map(&state, 9, MapUpdate::default()).await, Ok(None));
        assert_eq!(get_map(&state, 9).await, None);
        assert!(!map_exists(&state, 9).await);
    }

    #[tokio::test]
    async fn rejected_update_leaves_the_map_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        let id = create_map(&state, new_map("Elbe")).await.unwrap();
        let update = MapUpdate {
            name: Some("Renamed".to_string()),
            lat: Some(91.0),
            ..MapUpdate::default()
        };
        assert!(update_map(&state, id, update).await.is_err());
        assert_eq!(get_map(&state, id).await.unwrap().name, "Elbe");
    }

    #[tokio::test]
    async fn flush_writes_only_changed_maps_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(&dir);
        let first = create_map(&state, new_map("First")).await.unwrap();
        create_map(&state, new_map("Second")).await.unwrap();

        assert_eq!(flush_dirty(&state).await, 2);
        assert_eq!(flush_dirty(&state).await, 0);

        update_map(&state, first, MapUpdate::features(features()))
            .await
            .unwrap();
        assert_eq!(flush_dirty(&state).await, 1);

        let reloaded = state_in(&dir);
        assert_eq!(load_maps(&reloaded).await.unwrap(), 2);
        assert_eq!(
            get_map(&reloaded, first).await.unwrap().features.len(),
            1
        );
        assert_eq!(create_map(&reloaded, new_map("Third")).await, Ok(3));
    }
}
