use serde::{Deserialize, Serialize};

mod records;

pub use records::{
    CreatedMap, MapRecord, MapSummary, MapUpdate, NewMapRecord, RecordError, MAX_NAME_LEN,
};

/// Geographic coordinate in degrees. Serialized GeoJSON-style as `[lng, lat]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn is_finite(self) -> bool {
        self.lng.is_finite() && self.lat.is_finite()
    }

    pub fn lerp(self, other: LngLat, t: f64) -> Self {
        Self {
            lng: self.lng + (other.lng - self.lng) * t,
            lat: self.lat + (other.lat - self.lat) * t,
        }
    }
}

impl From<[f64; 2]> for LngLat {
    fn from([lng, lat]: [f64; 2]) -> Self {
        Self { lng, lat }
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(point: LngLat) -> Self {
        [point.lng, point.lat]
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Stroke {
    pub points: Vec<LngLat>,
}

impl Stroke {
    pub fn new(points: Vec<LngLat>) -> Self {
        Self { points }
    }

    pub fn single(point: LngLat) -> Self {
        Self {
            points: vec![point],
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<LngLat> {
        self.points.last().copied()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeometryKind {
    MultiLineString,
    LineString,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    MultiLineString(Vec<Stroke>),
    LineString(Stroke),
}

impl Geometry {
    pub fn kind(&self) -> GeometryKind {
        match self {
            Geometry::MultiLineString(_) => GeometryKind::MultiLineString,
            Geometry::LineString(_) => GeometryKind::LineString,
        }
    }

    pub fn strokes(&self) -> &[Stroke] {
        match self {
            Geometry::MultiLineString(strokes) => strokes,
            Geometry::LineString(stroke) => std::slice::from_ref(stroke),
        }
    }

    pub fn last_point(&self) -> Option<LngLat> {
        self.strokes().last().and_then(Stroke::last)
    }

    pub fn point_count(&self) -> usize {
        self.strokes().iter().map(Stroke::len).sum()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Appearance {
    pub color: String,
    pub width: f64,
    pub opacity: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureProperties {
    pub appearance: Appearance,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub properties: FeatureProperties,
}

impl Feature {
    pub fn appearance(&self) -> &Appearance {
        &self.properties.appearance
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn contains(&self, id: &FeatureId) -> bool {
        self.features.iter().any(|feature| &feature.id == id)
    }

    pub fn get(&self, id: &FeatureId) -> Option<&Feature> {
        self.features.iter().find(|feature| &feature.id == id)
    }

    pub fn get_mut(&mut self, id: &FeatureId) -> Option<&mut Feature> {
        self.features.iter_mut().find(|feature| &feature.id == id)
    }

    pub fn push(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    pub fn pop(&mut self) -> Option<Feature> {
        self.features.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pen_feature() -> Feature {
        Feature {
            id: FeatureId::new("1234567890123456"),
            geometry: Geometry::MultiLineString(vec![Stroke::new(vec![
                LngLat::new(13.73, 51.05),
                LngLat::new(13.74, 51.06),
            ])]),
            properties: FeatureProperties {
                appearance: Appearance {
                    color: "#000".to_string(),
                    width: 11.0,
                    opacity: 0.7,
                },
            },
        }
    }

    #[test]
    fn feature_serializes_as_geojson() {
        let value = serde_json::to_value(pen_feature()).unwrap();
        assert_eq!(value["type"], "Feature");
        assert_eq!(value["id"], "1234567890123456");
        assert_eq!(value["geometry"]["type"], "MultiLineString");
        assert_eq!(
            value["geometry"]["coordinates"],
            serde_json::json!([[[13.73, 51.05], [13.74, 51.06]]])
        );
        assert_eq!(value["properties"]["appearance"]["color"], "#000");
    }

    #[test]
    fn collection_parses_geojson_text() {
        let text = r##"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "id": "42",
                "geometry": {"type": "LineString", "coordinates": [[1.0, 2.0], [3.0, 4.0]]},
                "properties": {"appearance": {"color": "#f00", "width": 2.0, "opacity": 1.0}}
            }]
        }"##;
        let collection: FeatureCollection = serde_json::from_str(text).unwrap();
        assert_eq!(collection.len(), 1);
        let feature = &collection.features[0];
        assert_eq!(feature.geometry.kind(), GeometryKind::LineString);
        assert_eq!(feature.geometry.last_point(), Some(LngLat::new(3.0, 4.0)));
    }

    #[test]
    fn last_point_of_empty_trailing_stroke_is_none() {
        let geometry = Geometry::MultiLineString(vec![
            Stroke::single(LngLat::new(1.0, 1.0)),
            Stroke::default(),
        ]);
        assert_eq!(geometry.last_point(), None);
        assert_eq!(geometry.point_count(), 1);
    }

    #[test]
    fn lookup_by_id() {
        let mut collection = FeatureCollection::new();
        collection.push(pen_feature());
        let id = FeatureId::new("1234567890123456");
        assert!(collection.contains(&id));
        assert!(collection.get(&FeatureId::new("nope")).is_none());
        assert_eq!(collection.pop().map(|f| f.id), Some(id));
        assert!(collection.is_empty());
    }
}
