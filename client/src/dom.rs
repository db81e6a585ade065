use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlSpanElement};

use crate::state::DrawMode;

pub fn get_element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    let element = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element: {id}")))?;
    element
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Invalid element type: {id}")))
}

pub fn update_value_label(input: &HtmlInputElement, value: &HtmlSpanElement) {
    value.set_text_content(Some(&input.value()));
}

pub fn set_tool_button(button: &HtmlButtonElement, active: bool) {
    let pressed = if active { "true" } else { "false" };
    let _ = button.set_attribute("aria-pressed", pressed);
}

pub fn mode_buttons(document: &Document) -> Result<Vec<(DrawMode, HtmlButtonElement)>, JsValue> {
    let nodes = document.query_selector_all("[data-mode]")?;
    let mut buttons = Vec::with_capacity(nodes.length() as usize);
    for index in 0..nodes.length() {
        let Some(node) = nodes.item(index) else {
            continue;
        };
        let Ok(button) = node.dyn_into::<HtmlButtonElement>() else {
            continue;
        };
        let Some(mode) = button
            .get_attribute("data-mode")
            .and_then(|value| value.parse::<DrawMode>().ok())
        else {
            log::warn!("toolbar button with unknown data-mode");
            continue;
        };
        buttons.push((mode, button));
    }
    Ok(buttons)
}

pub fn sync_mode_buttons(buttons: &[(DrawMode, HtmlButtonElement)], current: DrawMode) {
    for (mode, button) in buttons {
        set_tool_button(button, *mode == current);
    }
}

pub fn set_map_cursor(container: &HtmlElement, mode: DrawMode) {
    let cursor = if mode.requires_drawing() {
        "crosshair"
    } else {
        ""
    };
    let _ = container.style().set_property("cursor", cursor);
}

pub fn set_status(status_el: &Element, state: &str, text: &str) {
    let _ = status_el.set_attribute("data-state", state);
    status_el.set_text_content(Some(text));
}

pub fn set_busy(button: &HtmlButtonElement, busy: bool) {
    let value = if busy { "true" } else { "false" };
    let _ = button.set_attribute("aria-busy", value);
    button.set_disabled(busy);
}
