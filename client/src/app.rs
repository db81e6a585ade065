use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Element, Event, HtmlButtonElement, HtmlElement, HtmlInputElement, HtmlSpanElement, KeyboardEvent};

use routesketch_shared::LngLat;

use crate::controller::DrawingController;
use crate::dom::{
    get_element, mode_buttons, set_busy, set_map_cursor, set_status, sync_mode_buttons,
    update_value_label,
};
use crate::map_view::{MapView, PointerKind};
use crate::maplibre::{event_name, pointer_event, MapLibreView};
use crate::net::{fetch_record, map_id_from_location, save_features};
use crate::state::{
    AppState, DrawMode, DEFAULT_CENTER, DEFAULT_ZOOM, HIGHLIGHT_LAYER, MAP_STYLE_URL,
    ROUTE_LAYER, ROUTE_SOURCE,
};
use crate::store::Subscription;
use crate::util::RandomIds;

const MAP_CONTAINER: &str = "map";

thread_local! {
    // Subscriptions of mounted maps live as long as the page.
    static MOUNTED: RefCell<Vec<Subscription>> = const { RefCell::new(Vec::new()) };
}

fn debug_enabled(window: &web_sys::Window) -> bool {
    let search = window.location().search().ok().unwrap_or_default();
    search.contains("debug=1") || search.contains("debug=true")
}

fn init_logging(window: &web_sys::Window) {
    let level = if debug_enabled(window) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    // Fails only when a logger is already installed.
    let _ = console_log::init_with_level(level);
}

fn keep_alive(subscription: Subscription) {
    MOUNTED.with(|mounted| mounted.borrow_mut().push(subscription));
}

#[wasm_bindgen(start)]
pub fn run() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;
    init_logging(&window);

    if document.ready_state() == "complete" {
        return start_app();
    }

    let started = Rc::new(Cell::new(false));
    let onload = Closure::<dyn FnMut(Event)>::new(move |_| {
        if started.replace(true) {
            return;
        }
        if let Err(err) = start_app() {
            web_sys::console::error_1(&err);
        }
    });
    window.add_event_listener_with_callback("load", onload.as_ref().unchecked_ref())?;
    onload.forget();

    Ok(())
}

fn start_app() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("Missing window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("Missing document"))?;

    let map_container: HtmlElement = get_element(&document, MAP_CONTAINER)?;
    let color_input: HtmlInputElement = get_element(&document, "color")?;
    let width_input: HtmlInputElement = get_element(&document, "width")?;
    let width_value: HtmlSpanElement = get_element(&document, "widthValue")?;
    let opacity_input: HtmlInputElement = get_element(&document, "opacity")?;
    let opacity_value: HtmlSpanElement = get_element(&document, "opacityValue")?;
    let undo_button: HtmlButtonElement = get_element(&document, "undo")?;
    let save_button: HtmlButtonElement = get_element(&document, "save")?;
    let status_el: Element = get_element(&document, "status")?;
    let mode_buttons = Rc::new(mode_buttons(&document)?);

    let state = Rc::new(AppState::new());
    let controller = Rc::new(RefCell::new(DrawingController::new(
        state.clone(),
        Box::new(RandomIds::browser()),
    )));
    let view = Rc::new(MapLibreView::create(
        MAP_CONTAINER,
        MAP_STYLE_URL,
        DEFAULT_CENTER,
        DEFAULT_ZOOM,
    )?);
    let map_id = map_id_from_location(&window.location());
    let dirty = Rc::new(Cell::new(false));

    color_input.set_value(&state.draw_color().get());
    width_input.set_value(&state.draw_width().get().to_string());
    opacity_input.set_value(&state.draw_opacity().get().to_string());
    update_value_label(&width_input, &width_value);
    update_value_label(&opacity_input, &opacity_value);
    set_status(&status_el, "idle", "Ready");

    {
        let view_cb = view.clone();
        let controller = controller.clone();
        let state = state.clone();
        let onload = Closure::<dyn FnMut(JsValue)>::new(move |_| {
            let added = state.features.with(|features| {
                view_cb.add_route_layers(ROUTE_SOURCE, ROUTE_LAYER, HIGHLIGHT_LAYER, features)
            });
            if let Err(err) = added {
                web_sys::console::error_1(&err);
                return;
            }
            view_cb.set_drag_pan(state.draw_mode.get() == DrawMode::Move);
            let map: Rc<dyn MapView> = view_cb.clone();
            controller.borrow_mut().attach_map(map);
            log::info!("map ready");
        });
        view.on("load", onload.as_ref().unchecked_ref());
        onload.forget();
    }

    for kind in [
        PointerKind::Down,
        PointerKind::Move,
        PointerKind::Up,
        PointerKind::Leave,
    ] {
        let controller = controller.clone();
        let listener = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
            if let Some(event) = pointer_event(&event) {
                controller.borrow_mut().handle_pointer(kind, &event);
            }
        });
        view.on(event_name(kind), listener.as_ref().unchecked_ref());
        listener.forget();
    }

    {
        let view = view.clone();
        let buttons = mode_buttons.clone();
        let container = map_container.clone();
        sync_mode_buttons(&buttons, state.draw_mode.get());
        set_map_cursor(&container, state.draw_mode.get());
        keep_alive(state.draw_mode.subscribe(move |mode| {
            sync_mode_buttons(&buttons, *mode);
            set_map_cursor(&container, *mode);
            view.set_drag_pan(*mode == DrawMode::Move);
        }));
    }

    {
        let dirty = dirty.clone();
        let status_el = status_el.clone();
        keep_alive(state.features.subscribe(move |features| {
            dirty.set(true);
            let text = match features.len() {
                1 => "1 route, unsaved".to_string(),
                count => format!("{count} routes, unsaved"),
            };
            set_status(&status_el, "dirty", &text);
        }));
    }

    for (mode, button) in mode_buttons.iter() {
        let mode = *mode;
        let state = state.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            state.draw_mode.set(mode);
        });
        button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let state = state.clone();
        let color_input_cb = color_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            state.set_color(color_input_cb.value());
        });
        color_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let state = state.clone();
        let width_input_cb = width_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Ok(index) = width_input_cb.value().parse::<u32>() {
                state.set_width(index);
            }
            update_value_label(&width_input_cb, &width_value);
        });
        width_input.add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let state = state.clone();
        let opacity_input_cb = opacity_input.clone();
        let oninput = Closure::<dyn FnMut(Event)>::new(move |_| {
            if let Ok(percent) = opacity_input_cb.value().parse::<u8>() {
                state.set_opacity(percent);
            }
            update_value_label(&opacity_input_cb, &opacity_value);
        });
        opacity_input
            .add_event_listener_with_callback("input", oninput.as_ref().unchecked_ref())?;
        oninput.forget();
    }

    {
        let controller = controller.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            controller.borrow_mut().undo_last_feature();
        });
        undo_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let controller = controller.clone();
        let onkeydown = Closure::<dyn FnMut(KeyboardEvent)>::new(move |event: KeyboardEvent| {
            let modifier = event.meta_key() || event.ctrl_key();
            if modifier && !event.shift_key() && event.key().eq_ignore_ascii_case("z") {
                event.prevent_default();
                controller.borrow_mut().undo_last_feature();
            }
        });
        window.add_event_listener_with_callback("keydown", onkeydown.as_ref().unchecked_ref())?;
        onkeydown.forget();
    }

    {
        let controller = controller.clone();
        let window_cb = window.clone();
        let save_button_cb = save_button.clone();
        let status_el = status_el.clone();
        let dirty = dirty.clone();
        let onclick = Closure::<dyn FnMut(Event)>::new(move |_| {
            let Some(id) = map_id else {
                set_status(&status_el, "error", "This map has no record to save to");
                return;
            };
            let serialized = match controller.borrow().serialize_features() {
                Ok(serialized) => serialized,
                Err(err) => {
                    log::error!("could not serialize features: {err}");
                    return;
                }
            };
            let window = window_cb.clone();
            let button = save_button_cb.clone();
            let status_el = status_el.clone();
            let dirty = dirty.clone();
            set_busy(&button, true);
            set_status(&status_el, "saving", "Saving...");
            spawn_local(async move {
                match save_features(&window, id, &serialized).await {
                    Ok(()) => {
                        dirty.set(false);
                        set_status(&status_el, "saved", "Saved");
                        log::info!("saved map {id}");
                    }
                    Err(err) => {
                        set_status(&status_el, "error", "Saving failed");
                        web_sys::console::error_1(&err);
                    }
                }
                set_busy(&button, false);
            });
        });
        save_button.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    {
        let dirty = dirty.clone();
        let onbeforeunload = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            if dirty.get() {
                event.prevent_default();
            }
        });
        window.add_event_listener_with_callback(
            "beforeunload",
            onbeforeunload.as_ref().unchecked_ref(),
        )?;
        onbeforeunload.forget();
    }

    match map_id {
        Some(id) => {
            let window = window.clone();
            let document = document.clone();
            spawn_local(async move {
                match fetch_record(&window, id).await {
                    Ok(record) => {
                        document.set_title(&record.name);
                        if let Err(err) = view.set_center(LngLat::new(record.lng, record.lat)) {
                            web_sys::console::error_1(&err);
                        }
                        log::info!("loaded map {id} with {} routes", record.features.len());
                        controller.borrow_mut().load_features(record.features);
                        dirty.set(false);
                        set_status(&status_el, "saved", "Saved");
                    }
                    Err(err) => {
                        set_status(&status_el, "error", "Could not load this map");
                        web_sys::console::error_1(&err);
                    }
                }
            });
        }
        None => log::info!("no map record in the page path, drawing without saving"),
    }

    Ok(())
}
