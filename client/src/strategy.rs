use routesketch_shared::{
    Appearance, Feature, FeatureId, FeatureProperties, Geometry, GeometryKind, LngLat, Stroke,
};

use crate::geometry::nearest_point_on_strokes;
use crate::map_view::{MapView, PointerEvent};
use crate::simplify::should_accept;
use crate::state::DrawMode;

pub struct NewFeatureOptions {
    pub id: FeatureId,
    pub start: LngLat,
    pub appearance: Appearance,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrawResult {
    pub has_coordinates: bool,
    pub is_finished: bool,
}

pub trait DrawingStrategy {
    fn kind(&self) -> GeometryKind;

    fn create_new_feature(&self, options: NewFeatureOptions) -> Feature;

    fn can_append(&self, candidate: &Feature) -> bool {
        candidate.geometry.kind() == self.kind()
    }

    fn start_append(&self, map: &dyn MapView, snap: &PointerEvent, feature: &mut Feature);

    fn draw(&self, map: &dyn MapView, event: &PointerEvent, feature: &mut Feature) -> DrawResult;
}

pub fn strategy_for(mode: DrawMode) -> Option<Box<dyn DrawingStrategy>> {
    match mode {
        DrawMode::Pen => Some(Box::new(LineStrategy)),
        DrawMode::Move | DrawMode::Highlighter | DrawMode::Circle | DrawMode::Polygon => None,
    }
}

pub struct LineStrategy;

impl DrawingStrategy for LineStrategy {
    fn kind(&self) -> GeometryKind {
        GeometryKind::MultiLineString
    }

    fn create_new_feature(&self, options: NewFeatureOptions) -> Feature {
        Feature {
            id: options.id,
            geometry: Geometry::MultiLineString(vec![Stroke::single(options.start)]),
            properties: FeatureProperties {
                appearance: options.appearance,
            },
        }
    }

    /// The new stroke starts at the point of the existing geometry nearest to
    /// the pointer, so the extension visibly joins the feature.
    fn start_append(&self, map: &dyn MapView, snap: &PointerEvent, feature: &mut Feature) {
        let Geometry::MultiLineString(strokes) = &mut feature.geometry else {
            return;
        };
        let anchor = nearest_point_on_strokes(strokes, snap.screen, |point| map.project(point))
            .unwrap_or(snap.lng_lat);
        strokes.push(Stroke::single(anchor));
    }

    fn draw(&self, map: &dyn MapView, event: &PointerEvent, feature: &mut Feature) -> DrawResult {
        let Geometry::MultiLineString(strokes) = &mut feature.geometry else {
            return DrawResult::default();
        };
        if !event.lng_lat.is_finite() {
            return DrawResult::default();
        }
        let last = strokes
            .last()
            .and_then(Stroke::last)
            .map(|point| map.project(point));
        if !should_accept(last, event.screen) {
            return DrawResult::default();
        }
        match strokes.last_mut() {
            Some(stroke) => stroke.points.push(event.lng_lat),
            None => strokes.push(Stroke::single(event.lng_lat)),
        }
        DrawResult {
            has_coordinates: true,
            is_finished: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map_view::fake::FakeMap;

    fn appearance() -> Appearance {
        Appearance {
            color: "#123456".to_string(),
            width: 8.0,
            opacity: 0.5,
        }
    }

    fn new_line(start: LngLat) -> Feature {
        LineStrategy.create_new_feature(NewFeatureOptions {
            id: FeatureId::new("1"),
            start,
            appearance: appearance(),
        })
    }

    #[test]
    fn new_feature_has_one_stroke_with_start_point() {
        let start = LngLat::new(13.0, 51.0);
        let feature = new_line(start);
        assert_eq!(feature.geometry.strokes(), &[Stroke::single(start)]);
        assert_eq!(feature.appearance(), &appearance());
    }

    #[test]
    fn draw_appends_only_distant_points() {
        let map = FakeMap::new();
        let mut feature = new_line(LngLat::new(0.0, 0.0));
        let near = map.pressed(10.0, 0.0);
        let far = map.pressed(20.0, 0.0);
        assert_eq!(LineStrategy.draw(&map, &near, &mut feature), DrawResult::default());
        let result = LineStrategy.draw(&map, &far, &mut feature);
        assert!(result.has_coordinates);
        assert!(!result.is_finished);
        assert_eq!(
            feature.geometry.strokes()[0].points,
            vec![LngLat::new(0.0, 0.0), LngLat::new(20.0, 0.0)]
        );
    }

    #[test]
    fn draw_uses_the_current_view() {
        let map = FakeMap::new();
        let mut feature = new_line(LngLat::new(0.0, 0.0));
        // Zoomed in 4x: 5 geographic units now span 20 pixels.
        map.scale.set(4.0);
        let event = map.pressed(20.0, 0.0);
        assert!(LineStrategy.draw(&map, &event, &mut feature).has_coordinates);
        assert_eq!(feature.geometry.last_point(), Some(LngLat::new(5.0, 0.0)));
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let map = FakeMap::new();
        let mut feature = new_line(LngLat::new(0.0, 0.0));
        let mut event = map.pressed(100.0, 0.0);
        event.lng_lat = LngLat::new(f64::NAN, 0.0);
        assert!(!LineStrategy.draw(&map, &event, &mut feature).has_coordinates);
        assert_eq!(feature.geometry.point_count(), 1);
    }

    #[test]
    fn append_opens_stroke_at_nearest_point() {
        let map = FakeMap::new();
        let mut feature = new_line(LngLat::new(0.0, 0.0));
        LineStrategy.draw(&map, &map.pressed(100.0, 0.0), &mut feature);
        LineStrategy.start_append(&map, &map.pressed(40.0, 3.0), &mut feature);
        let strokes = feature.geometry.strokes();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[1], Stroke::single(LngLat::new(40.0, 0.0)));
    }

    #[test]
    fn line_strings_are_not_appendable() {
        let feature = Feature {
            geometry: Geometry::LineString(Stroke::single(LngLat::new(0.0, 0.0))),
            ..new_line(LngLat::new(0.0, 0.0))
        };
        assert!(!LineStrategy.can_append(&feature));
        assert!(LineStrategy.can_append(&new_line(LngLat::new(0.0, 0.0))));
    }

    #[test]
    fn only_pen_has_a_strategy() {
        assert!(strategy_for(DrawMode::Pen).is_some());
        assert!(strategy_for(DrawMode::Move).is_none());
        assert!(strategy_for(DrawMode::Polygon).is_none());
    }
}
