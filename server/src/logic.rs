use std::collections::HashSet;

use routesketch_shared::{
    Appearance, Feature, FeatureCollection, Geometry, LngLat, Stroke,
};

use crate::state::{MAX_FEATURES, MAX_POINTS_PER_STROKE};

const MAX_ID_LEN: usize = 64;
const MAX_COLOR_LEN: usize = 32;
const DEFAULT_COLOR: &str = "#000";
const MIN_LINE_WIDTH: f64 = 1.0;
const MAX_LINE_WIDTH: f64 = 90.0;
const DEFAULT_OPACITY: f64 = 0.7;

/// Features with unusable ids or without any drawable stroke are dropped, a
/// repeated id keeps only its first feature, and only the newest
/// `MAX_FEATURES` features survive.
pub fn sanitize_features(collection: FeatureCollection) -> FeatureCollection {
    let mut seen = HashSet::new();
    let mut features = collection
        .features
        .into_iter()
        .filter_map(sanitize_feature)
        .filter(|feature| seen.insert(feature.id.clone()))
        .collect::<Vec<_>>();
    let overflow = features.len().saturating_sub(MAX_FEATURES);
    if overflow > 0 {
        tracing::debug!(overflow, "dropping oldest features over the limit");
        features.drain(0..overflow);
    }
    FeatureCollection { features }
}

fn sanitize_feature(mut feature: Feature) -> Option<Feature> {
    let id = feature.id.as_str();
    if id.is_empty() || id.len() > MAX_ID_LEN {
        return None;
    }
    feature.geometry = sanitize_geometry(feature.geometry)?;
    feature.properties.appearance = sanitize_appearance(feature.properties.appearance);
    Some(feature)
}

fn sanitize_geometry(geometry: Geometry) -> Option<Geometry> {
    match geometry {
        Geometry::MultiLineString(strokes) => {
            let strokes = strokes
                .into_iter()
                .filter_map(sanitize_stroke)
                .collect::<Vec<_>>();
            (!strokes.is_empty()).then_some(Geometry::MultiLineString(strokes))
        }
        Geometry::LineString(stroke) => sanitize_stroke(stroke).map(Geometry::LineString),
    }
}

fn sanitize_stroke(stroke: Stroke) -> Option<Stroke> {
    let points = stroke
        .points
        .into_iter()
        .filter(|point| is_valid_point(*point))
        .take(MAX_POINTS_PER_STROKE)
        .collect::<Vec<_>>();
    (!points.is_empty()).then(|| Stroke::new(points))
}

fn is_valid_point(point: LngLat) -> bool {
    point.is_finite() && point.lng.abs() <= 180.0 && point.lat.abs() <= 90.0
}

fn sanitize_appearance(appearance: Appearance) -> Appearance {
    Appearance {
        color: sanitize_color(appearance.color),
        width: sanitize_width(appearance.width),
        opacity: sanitize_opacity(appearance.opacity),
    }
}

fn sanitize_color(mut color: String) -> String {
    if color.trim().is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    if color.len() > MAX_COLOR_LEN {
        let mut end = MAX_COLOR_LEN;
        while !color.is_char_boundary(end) {
            end -= 1;
        }
        color.truncate(end);
    }
    color
}

fn sanitize_width(width: f64) -> f64 {
    // 5 on the width slider.
    let width = if width.is_finite() { width } else { 5.0 * 5f64.sqrt() };
    width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
}

fn sanitize_opacity(opacity: f64) -> f64 {
    let opacity = if opacity.is_finite() {
        opacity
    } else {
        DEFAULT_OPACITY
    };
    opacity.clamp(0.0, 1.0)
}
