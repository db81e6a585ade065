use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use routesketch_shared::MapRecord;
use tokio::sync::RwLock;

use crate::storage::Storage;

pub const MAX_FEATURES: usize = 2000;
pub const MAX_POINTS_PER_STROKE: usize = 5000;

#[derive(Clone)]
pub struct AppState {
    pub maps: Arc<RwLock<BTreeMap<i64, Arc<RwLock<MapEntry>>>>>,
    pub storage: Arc<dyn Storage>,
    pub index_file: PathBuf,
}

pub struct MapEntry {
    pub record: MapRecord,
    pub dirty: bool,
}

impl MapEntry {
    pub fn new(record: MapRecord, dirty: bool) -> Self {
        Self { record, dirty }
    }
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, index_file: PathBuf) -> Self {
        Self {
            maps: Arc::new(RwLock::new(BTreeMap::new())),
            storage,
            index_file,
        }
    }
}
