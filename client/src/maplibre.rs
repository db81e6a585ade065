use js_sys::{Array, Reflect};
use serde::Serialize;
use serde_json::json;
use wasm_bindgen::prelude::*;

use routesketch_shared::{FeatureCollection, FeatureId, LngLat};

use crate::geometry::{ScreenBox, ScreenPoint};
use crate::map_view::{LayerFilter, MapView, PointerEvent, PointerKind};
use crate::util::id_from_number;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    pub type MaplibreMap;

    #[wasm_bindgen(constructor, catch, js_namespace = maplibregl, js_class = "Map")]
    fn new(options: &JsValue) -> Result<MaplibreMap, JsValue>;

    #[wasm_bindgen(method, js_class = "Map")]
    fn project(this: &MaplibreMap, lng_lat: &JsValue) -> JsValue;

    #[wasm_bindgen(method, js_class = "Map", js_name = queryRenderedFeatures)]
    fn query_rendered_features(this: &MaplibreMap, geometry: &JsValue, options: &JsValue)
        -> Array;

    #[wasm_bindgen(method, js_class = "Map", js_name = getSource)]
    fn get_source(this: &MaplibreMap, id: &str) -> Option<GeoJsonSource>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = addSource)]
    fn add_source(this: &MaplibreMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = addLayer)]
    fn add_layer(this: &MaplibreMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = setFilter)]
    fn set_filter(this: &MaplibreMap, layer: &str, filter: &JsValue);

    #[wasm_bindgen(method, js_class = "Map", js_name = setCenter)]
    fn set_center(this: &MaplibreMap, center: &JsValue);

    #[wasm_bindgen(method, js_class = "Map")]
    fn on(this: &MaplibreMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, getter, js_class = "Map", js_name = dragPan)]
    fn drag_pan(this: &MaplibreMap) -> DragPanHandler;

    pub type GeoJsonSource;

    #[wasm_bindgen(method, js_name = setData)]
    fn set_data(this: &GeoJsonSource, data: &JsValue);

    pub type DragPanHandler;

    #[wasm_bindgen(method)]
    fn enable(this: &DragPanHandler);

    #[wasm_bindgen(method)]
    fn disable(this: &DragPanHandler);
}

pub fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let text = serde_json::to_string(value).map_err(|err| JsValue::from_str(&err.to_string()))?;
    js_sys::JSON::parse(&text)
}

fn number(target: &JsValue, key: &str) -> Option<f64> {
    Reflect::get(target, &JsValue::from_str(key)).ok()?.as_f64()
}

fn screen_point(value: &JsValue) -> Option<ScreenPoint> {
    Some(ScreenPoint::new(number(value, "x")?, number(value, "y")?))
}

/// Rendered feature ids come back as strings or, for digit-only ids, numbers.
fn feature_id(feature: &JsValue) -> Option<FeatureId> {
    let id = Reflect::get(feature, &JsValue::from_str("id")).ok()?;
    if let Some(text) = id.as_string() {
        return Some(FeatureId::new(text));
    }
    id.as_f64().and_then(id_from_number)
}

pub fn pointer_event(event: &JsValue) -> Option<PointerEvent> {
    let point = Reflect::get(event, &JsValue::from_str("point")).ok()?;
    let lng_lat = Reflect::get(event, &JsValue::from_str("lngLat")).ok()?;
    let buttons = Reflect::get(event, &JsValue::from_str("originalEvent"))
        .ok()
        .and_then(|original| number(&original, "buttons"))
        .unwrap_or(0.0);
    Some(PointerEvent::new(
        screen_point(&point)?,
        LngLat::new(number(&lng_lat, "lng")?, number(&lng_lat, "lat")?),
        buttons as u16,
    ))
}

pub fn event_name(kind: PointerKind) -> &'static str {
    match kind {
        PointerKind::Down => "mousedown",
        PointerKind::Move => "mousemove",
        PointerKind::Up => "mouseup",
        PointerKind::Leave => "mouseout",
    }
}

pub struct MapLibreView {
    map: MaplibreMap,
}

impl MapLibreView {
    pub fn create(container: &str, style: &str, center: LngLat, zoom: f64) -> Result<Self, JsValue> {
        let options = to_js(&json!({
            "container": container,
            "style": style,
            "center": center,
            "zoom": zoom,
        }))?;
        Ok(Self {
            map: MaplibreMap::new(&options)?,
        })
    }

    pub fn on(&self, event: &str, listener: &js_sys::Function) {
        self.map.on(event, listener);
    }

    pub fn set_center(&self, center: LngLat) -> Result<(), JsValue> {
        self.map.set_center(&to_js(&center)?);
        Ok(())
    }

    pub fn set_drag_pan(&self, enabled: bool) {
        let handler = self.map.drag_pan();
        if enabled {
            handler.enable();
        } else {
            handler.disable();
        }
    }

    pub fn add_route_layers(
        &self,
        source: &str,
        route_layer: &str,
        highlight_layer: &str,
        features: &FeatureCollection,
    ) -> Result<(), JsValue> {
        self.map.add_source(
            source,
            &to_js(&json!({ "type": "geojson", "data": features }))?,
        )?;
        self.map.add_layer(&to_js(&json!({
            "id": route_layer,
            "type": "line",
            "source": source,
            "layout": { "line-cap": "round", "line-join": "round" },
            "paint": {
                "line-color": ["get", "color", ["get", "appearance"]],
                "line-width": ["get", "width", ["get", "appearance"]],
                "line-opacity": ["get", "opacity", ["get", "appearance"]],
            },
        }))?)?;
        self.map.add_layer(&to_js(&json!({
            "id": highlight_layer,
            "type": "line",
            "source": source,
            "layout": { "line-cap": "round", "line-join": "round" },
            "paint": {
                "line-color": "#ffd400",
                "line-width": ["+", ["get", "width", ["get", "appearance"]], 6],
                "line-opacity": 0.6,
            },
            "filter": filter_expression(&LayerFilter::Nothing),
        }))?)?;
        Ok(())
    }
}

fn filter_expression(filter: &LayerFilter) -> serde_json::Value {
    match filter {
        LayerFilter::Nothing => json!(["==", 1, 0]),
        LayerFilter::Only(id) => json!(["==", ["to-string", ["id"]], id]),
    }
}

impl MapView for MapLibreView {
    fn project(&self, point: LngLat) -> ScreenPoint {
        let lng_lat = Array::of2(&JsValue::from_f64(point.lng), &JsValue::from_f64(point.lat));
        screen_point(&self.map.project(&lng_lat))
            .unwrap_or_else(|| ScreenPoint::new(f64::NAN, f64::NAN))
    }

    fn query_rendered_features(&self, area: ScreenBox, layer: &str) -> Vec<FeatureId> {
        let geometry = json!([[area.min.x, area.min.y], [area.max.x, area.max.y]]);
        let options = json!({ "layers": [layer], "validate": true });
        let (Ok(geometry), Ok(options)) = (to_js(&geometry), to_js(&options)) else {
            return Vec::new();
        };
        self.map
            .query_rendered_features(&geometry, &options)
            .iter()
            .filter_map(|feature| feature_id(&feature))
            .collect()
    }

    fn set_source_data(&self, source: &str, data: &FeatureCollection) -> bool {
        let Some(target) = self.map.get_source(source) else {
            return false;
        };
        match to_js(data) {
            Ok(data) => {
                target.set_data(&data);
                true
            }
            Err(err) => {
                log::warn!("could not convert features for {source}: {err:?}");
                false
            }
        }
    }

    fn set_layer_filter(&self, layer: &str, filter: &LayerFilter) {
        match to_js(&filter_expression(filter)) {
            Ok(expression) => self.map.set_filter(layer, &expression),
            Err(err) => log::warn!("could not build filter for {layer}: {err:?}"),
        }
    }
}
