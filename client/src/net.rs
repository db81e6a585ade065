use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Location, Request, RequestInit, Response, Window};

use routesketch_shared::MapRecord;

pub fn map_id_from_location(location: &Location) -> Option<i64> {
    map_id_from_path(&location.pathname().ok()?)
}

fn map_id_from_path(path: &str) -> Option<i64> {
    let mut parts = path.trim_matches('/').split('/');
    if parts.next()? != "map" {
        return None;
    }
    let id = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(id)
}

fn record_url(id: i64) -> String {
    format!("/api/maps/{id}")
}

async fn send(window: &Window, request: &Request) -> Result<Response, JsValue> {
    let response: Response = JsFuture::from(window.fetch_with_request(request))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "{} {} answered {}",
            request.method(),
            request.url(),
            response.status()
        )));
    }
    Ok(response)
}

async fn response_text(response: &Response) -> Result<String, JsValue> {
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

pub async fn fetch_record(window: &Window, id: i64) -> Result<MapRecord, JsValue> {
    let init = RequestInit::new();
    init.set_method("GET");
    let request = Request::new_with_str_and_init(&record_url(id), &init)?;
    let response = send(window, &request).await?;
    let text = response_text(&response).await?;
    serde_json::from_str(&text).map_err(|err| JsValue::from_str(&err.to_string()))
}

// `serialized` is already a feature collection document; it becomes the
// `features` field of a `MapUpdate` as is.
pub fn features_update_body(serialized: &str) -> String {
    format!("{{\"features\":{serialized}}}")
}

pub async fn save_features(window: &Window, id: i64, serialized: &str) -> Result<(), JsValue> {
    let init = RequestInit::new();
    init.set_method("PUT");
    init.set_body(&JsValue::from_str(&features_update_body(serialized)));
    let request = Request::new_with_str_and_init(&record_url(id), &init)?;
    request.headers().set("Content-Type", "application/json")?;
    send(window, &request).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use routesketch_shared::{FeatureCollection, MapUpdate};

    use super::*;

    #[test]
    fn update_body_carries_serialized_features() {
        let serialized = r#"{"type":"FeatureCollection","features":[]}"#;
        let update: MapUpdate = serde_json::from_str(&features_update_body(serialized)).unwrap();
        assert_eq!(update, MapUpdate::features(FeatureCollection::new()));
    }

    #[test]
    fn map_id_comes_from_map_paths_only() {
        assert_eq!(map_id_from_path("/map/42"), Some(42));
        assert_eq!(map_id_from_path("/map/42/"), Some(42));
        assert_eq!(map_id_from_path("/map/abc"), None);
        assert_eq!(map_id_from_path("/maps/42"), None);
        assert_eq!(map_id_from_path("/map/42/edit"), None);
        assert_eq!(map_id_from_path("/"), None);
    }
}
