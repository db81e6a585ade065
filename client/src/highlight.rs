use routesketch_shared::FeatureId;

use crate::geometry::{ScreenBox, ScreenPoint};
use crate::map_view::{LayerFilter, MapView};
use crate::state::AppState;

pub const HIGHLIGHT_HALF_BOX: f64 = 5.0;

pub struct HighlightTracker {
    route_layer: String,
    highlight_layer: String,
}

impl HighlightTracker {
    pub fn new(route_layer: impl Into<String>, highlight_layer: impl Into<String>) -> Self {
        Self {
            route_layer: route_layer.into(),
            highlight_layer: highlight_layer.into(),
        }
    }

    pub fn on_pointer_move(&self, map: &dyn MapView, state: &AppState, cursor: ScreenPoint) {
        if state.is_drawing.get() {
            return;
        }
        let area = ScreenBox::around(cursor, HIGHLIGHT_HALF_BOX);
        let topmost = map
            .query_rendered_features(area, &self.route_layer)
            .into_iter()
            .next();
        // The renderer may still hold features that were removed from the collection.
        let resolved = topmost.filter(|id| state.features.with(|features| features.contains(id)));
        match resolved {
            Some(id) => self.set(map, state, id),
            None => self.clear(map, state),
        }
    }

    pub fn clear(&self, map: &dyn MapView, state: &AppState) {
        if state.highlight.with(Option::is_none) {
            return;
        }
        log::trace!("highlight cleared");
        map.set_layer_filter(&self.highlight_layer, &LayerFilter::Nothing);
        state.highlight.set(None);
    }

    pub fn resolve(&self, state: &AppState) -> Option<FeatureId> {
        state
            .highlight
            .get()
            .filter(|id| state.features.with(|features| features.contains(id)))
    }

    fn set(&self, map: &dyn MapView, state: &AppState, id: FeatureId) {
        if state.highlight.with(|current| current.as_ref() == Some(&id)) {
            return;
        }
        log::trace!("highlight {id}");
        map.set_layer_filter(&self.highlight_layer, &LayerFilter::Only(id.clone()));
        state.highlight.set(Some(id));
    }
}
