use std::str::FromStr;

use routesketch_shared::{Appearance, FeatureCollection, FeatureId, LngLat};

use crate::store::{Observable, ReadOnly};

pub const ROUTE_SOURCE: &str = "routes";
pub const ROUTE_LAYER: &str = "route";
pub const HIGHLIGHT_LAYER: &str = "route-highlight";
pub const MAP_STYLE_URL: &str = "https://demotiles.maplibre.org/style.json";
pub const DEFAULT_CENTER: LngLat = LngLat {
    lng: 13.7373,
    lat: 51.0504,
};
pub const DEFAULT_ZOOM: f64 = 12.0;

pub const DEFAULT_COLOR: &str = "#000";
pub const DEFAULT_WIDTH: u32 = 5;
pub const MIN_WIDTH: u32 = 1;
pub const MAX_WIDTH: u32 = 20;
pub const DEFAULT_OPACITY: u8 = 70;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawMode {
    #[default]
    Move,
    Pen,
    Highlighter,
    Circle,
    Polygon,
}

impl DrawMode {
    pub const ALL: [DrawMode; 5] = [
        DrawMode::Move,
        DrawMode::Pen,
        DrawMode::Highlighter,
        DrawMode::Circle,
        DrawMode::Polygon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DrawMode::Move => "move",
            DrawMode::Pen => "pen",
            DrawMode::Highlighter => "highlighter",
            DrawMode::Circle => "circle",
            DrawMode::Polygon => "polygon",
        }
    }

    pub fn requires_drawing(self) -> bool {
        self != DrawMode::Move
    }
}

impl FromStr for DrawMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DrawMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == value)
            .ok_or_else(|| format!("Unknown draw mode: {value}"))
    }
}

pub fn scaled_width(index: u32) -> f64 {
    let width = index as f64;
    width * width.sqrt()
}

pub fn normalized_opacity(percent: u8) -> f64 {
    f64::from(percent.min(100)) / 100.0
}

pub fn sanitize_color(mut color: String) -> String {
    color = color.trim().to_string();
    if color.is_empty() {
        return DEFAULT_COLOR.to_string();
    }
    if let Some((end, _)) = color.char_indices().nth(32) {
        color.truncate(end);
    }
    color
}

pub struct AppState {
    pub features: Observable<FeatureCollection>,
    pub draw_mode: Observable<DrawMode>,
    draw_color: Observable<String>,
    draw_width: Observable<u32>,
    draw_opacity: Observable<u8>,
    pub(crate) is_drawing: Observable<bool>,
    pub(crate) highlight: Observable<Option<FeatureId>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            features: Observable::new(FeatureCollection::new()),
            draw_mode: Observable::new(DrawMode::default()),
            draw_color: Observable::new(DEFAULT_COLOR.to_string()),
            draw_width: Observable::new(DEFAULT_WIDTH),
            draw_opacity: Observable::new(DEFAULT_OPACITY),
            is_drawing: Observable::new(false),
            highlight: Observable::new(None),
        }
    }

    pub fn is_drawing(&self) -> ReadOnly<'_, bool> {
        self.is_drawing.read_only()
    }

    pub fn highlight(&self) -> ReadOnly<'_, Option<FeatureId>> {
        self.highlight.read_only()
    }

    pub fn draw_color(&self) -> ReadOnly<'_, String> {
        self.draw_color.read_only()
    }

    pub fn draw_width(&self) -> ReadOnly<'_, u32> {
        self.draw_width.read_only()
    }

    pub fn draw_opacity(&self) -> ReadOnly<'_, u8> {
        self.draw_opacity.read_only()
    }

    pub fn set_color(&self, color: String) {
        self.draw_color.set(sanitize_color(color));
    }

    pub fn set_width(&self, index: u32) {
        self.draw_width.set(index.clamp(MIN_WIDTH, MAX_WIDTH));
    }

    pub fn set_opacity(&self, percent: u8) {
        self.draw_opacity.set(percent.min(100));
    }

    pub fn current_appearance(&self) -> Appearance {
        Appearance {
            color: self.draw_color.get(),
            width: scaled_width(self.draw_width.get()),
            opacity: normalized_opacity(self.draw_opacity.get()),
        }
    }

    pub fn feature_count(&self) -> usize {
        self.features.with(FeatureCollection::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_scale_is_sub_quadratic() {
        assert_eq!(scaled_width(1), 1.0);
        assert_eq!(scaled_width(4), 8.0);
        assert!((scaled_width(5) - 11.1803).abs() < 1e-3);
    }

    #[test]
    fn opacity_percent_is_normalized() {
        assert_eq!(normalized_opacity(70), 0.7);
        assert_eq!(normalized_opacity(0), 0.0);
        assert_eq!(normalized_opacity(250), 1.0);
    }

    #[test]
    fn defaults_match_toolbar() {
        let state = AppState::new();
        assert_eq!(state.draw_mode.get(), DrawMode::Move);
        assert!(!state.is_drawing().get());
        let appearance = state.current_appearance();
        assert_eq!(appearance.color, "#000");
        assert_eq!(appearance.opacity, 0.7);
    }

    #[test]
    fn settings_are_clamped() {
        let state = AppState::new();
        state.set_width(0);
        assert_eq!(state.draw_width().get(), MIN_WIDTH);
        state.set_width(99);
        assert_eq!(state.draw_width().get(), MAX_WIDTH);
        state.set_color("   ".to_string());
        assert_eq!(state.draw_color().get(), DEFAULT_COLOR);
    }

    #[test]
    fn draw_mode_parses_attribute_values() {
        assert_eq!("pen".parse::<DrawMode>(), Ok(DrawMode::Pen));
        assert!("lasso".parse::<DrawMode>().is_err());
        assert!(!DrawMode::Move.requires_drawing());
        assert!(DrawMode::Polygon.requires_drawing());
    }
}
