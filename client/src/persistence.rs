use routesketch_shared::{Feature, FeatureCollection, MapRecord};

pub fn serialize_features(features: &FeatureCollection) -> serde_json::Result<String> {
    serde_json::to_string(features)
}

pub fn parse_features(text: &str) -> Option<FeatureCollection> {
    if let Ok(collection) = serde_json::from_str::<FeatureCollection>(text) {
        return Some(collection);
    }
    if let Ok(features) = serde_json::from_str::<Vec<Feature>>(text) {
        return Some(FeatureCollection { features });
    }
    serde_json::from_str::<MapRecord>(text)
        .ok()
        .map(|record| record.features)
}

#[cfg(test)]
mod tests {
    use routesketch_shared::{
        Appearance, FeatureId, FeatureProperties, Geometry, LngLat, Stroke,
    };

    use super::*;

    fn collection() -> FeatureCollection {
        FeatureCollection {
            features: vec![Feature {
                id: FeatureId::new("0000000000000001"),
                geometry: Geometry::MultiLineString(vec![
                    Stroke::new(vec![LngLat::new(1.0, 2.0), LngLat::new(3.0, 4.0)]),
                    Stroke::single(LngLat::new(5.0, 6.0)),
                ]),
                properties: FeatureProperties {
                    appearance: Appearance {
                        color: "#e33".to_string(),
                        width: 11.18,
                        opacity: 0.7,
                    },
                },
            }],
        }
    }

    #[test]
    fn serialized_collection_parses_back() {
        let text = serialize_features(&collection()).unwrap();
        assert!(text.starts_with(r#"{"type":"FeatureCollection""#));
        assert_eq!(parse_features(&text), Some(collection()));
    }

    #[test]
    fn bare_feature_array_is_accepted() {
        let text = serde_json::to_string(&collection().features).unwrap();
        assert_eq!(parse_features(&text), Some(collection()));
    }

    #[test]
    fn map_record_payload_yields_its_features() {
        let text = format!(
            r#"{{"id":3,"name":"Elbe","description":null,"lat":51.05,"lng":13.73,"created_at":"2024-05-01T10:00:00Z","features":{}}}"#,
            serialize_features(&collection()).unwrap()
        );
        assert_eq!(parse_features(&text), Some(collection()));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_features("not json"), None);
        assert_eq!(parse_features(r#"{"type":"Point"}"#), None);
    }
}
