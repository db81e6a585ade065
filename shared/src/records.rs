use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::FeatureCollection;

pub const MAX_NAME_LEN: usize = 200;
const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("name is longer than {} characters", MAX_NAME_LEN)]
    NameTooLong,
    #[error("description is longer than {} characters", MAX_DESCRIPTION_LEN)]
    DescriptionTooLong,
    #[error("{field} must be a finite number within ±{limit}")]
    InvalidCoordinate { field: &'static str, limit: f64 },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub features: FeatureCollection,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MapSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub created_at: DateTime<Utc>,
}

impl From<&MapRecord> for MapSummary {
    fn from(record: &MapRecord) -> Self {
        Self {
            id: record.id,
            name: record.name.clone(),
            description: record.description.clone(),
            lat: record.lat,
            lng: record.lng,
            created_at: record.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct CreatedMap {
    pub id: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NewMapRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub lat: f64,
    pub lng: f64,
}

impl NewMapRecord {
    pub fn validate(self) -> Result<Self, RecordError> {
        Ok(Self {
            name: clean_name(&self.name)?,
            description: clean_description(self.description.as_deref())?,
            lat: check_coordinate("lat", self.lat, 90.0)?,
            lng: check_coordinate("lng", self.lng, 180.0)?,
        })
    }

    pub fn into_record(self, id: i64, created_at: DateTime<Utc>) -> MapRecord {
        MapRecord {
            id,
            name: self.name,
            description: self.description,
            lat: self.lat,
            lng: self.lng,
            created_at,
            features: FeatureCollection::new(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct MapUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub features: Option<FeatureCollection>,
}

impl MapUpdate {
    pub fn features(features: FeatureCollection) -> Self {
        Self {
            features: Some(features),
            ..Self::default()
        }
    }

    /// Validates every present field first, then applies them all, so a rejected
    /// update leaves the record untouched.
    pub fn apply(self, record: &mut MapRecord) -> Result<(), RecordError> {
        let name = self.name.as_deref().map(clean_name).transpose()?;
        let description = match self.description.as_deref() {
            Some(text) => Some(clean_description(Some(text))?),
            None => None,
        };
        let lat = self
            .lat
            .map(|lat| check_coordinate("lat", lat, 90.0))
            .transpose()?;
        let lng = self
            .lng
            .map(|lng| check_coordinate("lng", lng, 180.0))
            .transpose()?;

        if let Some(name) = name {
            record.name = name;
        }
        if let Some(description) = description {
            record.description = description;
        }
        if let Some(lat) = lat {
            record.lat = lat;
        }
        if let Some(lng) = lng {
            record.lng = lng;
        }
        if let Some(features) = self.features {
            record.features = features;
        }
        Ok(())
    }
}

fn clean_name(name: &str) -> Result<String, RecordError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RecordError::EmptyName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RecordError::NameTooLong);
    }
    Ok(name.to_string())
}

fn clean_description(description: Option<&str>) -> Result<Option<String>, RecordError> {
    let Some(text) = description.map(str::trim) else {
        return Ok(None);
    };
    if text.is_empty() {
        return Ok(None);
    }
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(RecordError::DescriptionTooLong);
    }
    Ok(Some(text.to_string()))
}

fn check_coordinate(field: &'static str, value: f64, limit: f64) -> Result<f64, RecordError> {
    if value.is_finite() && value.abs() <= limit {
        Ok(value)
    } else {
        Err(RecordError::InvalidCoordinate { field, limit })
    }
}
