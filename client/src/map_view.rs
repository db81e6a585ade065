use routesketch_shared::{FeatureCollection, FeatureId, LngLat};

use crate::geometry::{ScreenBox, ScreenPoint};

pub const PRIMARY_BUTTON: u16 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Leave,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerEvent {
    pub screen: ScreenPoint,
    pub lng_lat: LngLat,
    pub buttons: u16,
}

impl PointerEvent {
    pub fn new(screen: ScreenPoint, lng_lat: LngLat, buttons: u16) -> Self {
        Self {
            screen,
            lng_lat,
            buttons,
        }
    }

    pub fn is_primary_only(&self) -> bool {
        self.buttons == PRIMARY_BUTTON
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum LayerFilter {
    Nothing,
    Only(FeatureId),
}

/// What the drawing engine needs from the map widget.
///
/// Every call reads the live view, so projections stay correct across pans and
/// zooms that happen mid-stroke.
pub trait MapView {
    fn project(&self, point: LngLat) -> ScreenPoint;

    /// Ids of rendered features of `layer` intersecting `area`, topmost first.
    fn query_rendered_features(&self, area: ScreenBox, layer: &str) -> Vec<FeatureId>;

    /// Replaces the data behind `source`. Returns `false` when no such source exists.
    fn set_source_data(&self, source: &str, data: &FeatureCollection) -> bool;

    fn set_layer_filter(&self, layer: &str, filter: &LayerFilter);
}
