use console_error_panic_hook::set_once;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlElement};

use chrono::NaiveDate;
use dashboard::{
    DashboardConfig, DashboardData, LoadTicket, MapComponent, MapEvent, SummaryCounter, load_view,
};
use formats::{GeoSource, ShelterFeed};
use foundation::math::Vec2;
use scene::{CanvasRect, Tooltip};
use serde::Serialize;

mod canvas;
mod source;
use canvas::{CanvasPainter, RafHost};
use source::GlooSource;

struct WebState {
    config: DashboardConfig,
    map: Rc<RefCell<MapComponent>>,
    painter: CanvasPainter,
    canvas: HtmlCanvasElement,
    tooltip: Option<HtmlElement>,
    data: Option<DashboardData>,
}

thread_local! {
    static STATE: RefCell<Option<WebState>> = const { RefCell::new(None) };
}

fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

fn document() -> Result<web_sys::Document, JsValue> {
    web_sys::window()
        .ok_or_else(|| JsValue::from_str("no window"))?
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))
}

fn element_by_id<T: JsCast>(id: &str) -> Result<T, JsValue> {
    document()?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing #{id}")))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("#{id} has the wrong element type")))
}

fn today() -> Option<NaiveDate> {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(now.get_full_year() as i32, now.get_month() + 1, now.get_date())
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    Ok(())
}

/// Attach the map to `canvas_id` and load the overview.
///
/// `config_json` may override any [`DashboardConfig`] field.
#[wasm_bindgen]
pub fn init_map(canvas_id: &str, tooltip_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
    let config = match config_json {
        Some(json) => DashboardConfig::from_json_str(&json).map_err(|e| JsValue::from_str(&e.to_string()))?,
        None => DashboardConfig::default(),
    };
    let canvas: HtmlCanvasElement = element_by_id(canvas_id)?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    let tooltip = element_by_id::<HtmlElement>(tooltip_id).ok();
    teardown();

    let host = RafHost::new(|_ts| animation_frame());
    let mut map = MapComponent::new(
        config.views.clone(),
        Box::new(host),
        f64::from(canvas.width()),
        f64::from(canvas.height()),
    )
    .with_tooltip_offset(config.tooltip_offset());
    map.subscribe(|event| match event {
        MapEvent::LoadFailed { generation, message } => log(&format!("map load {generation} failed: {message}")),
        MapEvent::StaleLoadDiscarded { generation } => log(&format!("map load {generation} superseded")),
        _ => {}
    });
    let map = Rc::new(RefCell::new(map));
    let ticket = map.borrow_mut().begin_current_load();

    STATE.with(|state| {
        *state.borrow_mut() = Some(WebState {
            config,
            map: Rc::clone(&map),
            painter: CanvasPainter::new(ctx),
            canvas,
            tooltip,
            data: None,
        });
    });

    spawn_load(map, ticket);
    Ok(())
}

fn spawn_load(map: Rc<RefCell<MapComponent>>, ticket: LoadTicket) {
    spawn_local(async move {
        // Failures are reported through the LoadFailed event.
        let _ = load_view(&map, &GlooSource, ticket).await;
    });
}

fn animation_frame() {
    STATE.with(|state| {
        let mut guard = state.borrow_mut();
        let Some(s) = guard.as_mut() else {
            return;
        };
        let mut map = s.map.borrow_mut();
        if let Some(handle) = map.pending_frame() {
            map.on_frame(handle, &mut s.painter);
        }
    });
}

fn canvas_rect(canvas: &HtmlCanvasElement) -> CanvasRect {
    let r = canvas.get_bounding_client_rect();
    CanvasRect {
        left: r.left(),
        top: r.top(),
        width: r.width(),
        height: r.height(),
    }
}

fn show_tooltip(el: &HtmlElement, tip: Option<&Tooltip>) {
    let style = el.style();
    let Some(tip) = tip else {
        let _ = style.set_property("display", "none");
        return;
    };
    el.set_inner_html(&tip.html());
    let _ = style.set_property("display", "block");
    let _ = style.set_property("left", &format!("{}px", tip.left));
    let _ = style.set_property("top", &format!("{}px", tip.top));
}

/// Pointer moved to viewport position (`client_x`, `client_y`).
#[wasm_bindgen]
pub fn on_pointer_move(client_x: f64, client_y: f64) {
    STATE.with(|state| {
        let guard = state.borrow();
        let Some(s) = guard.as_ref() else {
            return;
        };
        let rect = canvas_rect(&s.canvas);
        let tip = s.map.borrow_mut().pointer_move(Vec2::new(client_x, client_y), rect);
        if let Some(el) = &s.tooltip {
            show_tooltip(el, tip.as_ref());
        }
    });
}

#[wasm_bindgen]
pub fn on_pointer_leave() {
    STATE.with(|state| {
        let guard = state.borrow();
        let Some(s) = guard.as_ref() else {
            return;
        };
        s.map.borrow_mut().pointer_leave();
        if let Some(el) = &s.tooltip {
            show_tooltip(el, None);
        }
    });
}

#[wasm_bindgen]
pub fn on_click() {
    let pending = STATE.with(|state| {
        let guard = state.borrow();
        let s = guard.as_ref()?;
        let ticket = s.map.borrow_mut().click()?;
        if let Some(el) = &s.tooltip {
            show_tooltip(el, None);
        }
        Some((Rc::clone(&s.map), ticket))
    });
    if let Some((map, ticket)) = pending {
        spawn_load(map, ticket);
    }
}

#[wasm_bindgen]
pub fn set_canvas_size(width: u32, height: u32) {
    STATE.with(|state| {
        let guard = state.borrow();
        let Some(s) = guard.as_ref() else {
            return;
        };
        s.canvas.set_width(width);
        s.canvas.set_height(height);
        s.map.borrow_mut().resize(f64::from(width), f64::from(height));
    });
}

#[wasm_bindgen]
pub fn teardown() {
    STATE.with(|state| {
        if let Some(s) = state.borrow_mut().take() {
            s.map.borrow_mut().teardown();
        }
    });
}

/// Fetch the shelter feed, derive the statistics, hand the city pressure
/// table to the map and start the summary counters.
#[wasm_bindgen]
pub fn load_dashboard() {
    let Some(config) = STATE.with(|state| state.borrow().as_ref().map(|s| s.config.clone())) else {
        log("load_dashboard called before init_map");
        return;
    };
    spawn_local(async move {
        let text = match GlooSource.fetch_text(&config.feed_url).await {
            Ok(t) => t,
            Err(err) => {
                log(&format!("feed fetch failed: {err}"));
                return;
            }
        };
        let feed = match ShelterFeed::from_json_str(&text) {
            Ok(f) => f,
            Err(err) => {
                log(&format!("feed parse failed: {err}"));
                return;
            }
        };
        let Some(today) = today() else {
            log("could not read the current date");
            return;
        };
        let data = DashboardData::from_feed(&feed, &config, today);
        let counters = data.counters(config.counter_duration_ms);
        let card_class = data.summary_class(&config).card_css();

        STATE.with(|state| {
            if let Some(s) = state.borrow_mut().as_mut() {
                s.map.borrow_mut().set_override_table(data.city_pressure.clone());
                s.data = Some(data);
            }
        });
        animate_counters(counters, card_class);
    });
}

fn animate_counters(counters: [SummaryCounter; 6], card_class: &'static str) {
    let start = js_sys::Date::now();
    let slot: Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>> = Rc::new(RefCell::new(None));
    let again = Rc::clone(&slot);

    *slot.borrow_mut() = Some(Closure::wrap(Box::new(move |_ts: f64| {
        let elapsed = js_sys::Date::now() - start;
        for counter in &counters {
            if let Ok(el) = element_by_id::<HtmlElement>(counter.element_id) {
                el.set_inner_text(&counter.text_at(elapsed));
            }
        }
        if counters.iter().all(|c| c.animation.is_done(elapsed)) {
            if let Ok(card) = element_by_id::<HtmlElement>("dashbColor") {
                let classes = card.class_list();
                let _ = classes.remove_3("card-null", "card-warning", "card-danger");
                let _ = classes.add_1(card_class);
            }
            // Drop the closure; this frame was the last.
            again.borrow_mut().take();
            return;
        }
        request_frame(&again);
    }) as Box<dyn FnMut(f64)>));

    request_frame(&slot);
}

fn request_frame(slot: &Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    if let Some(cb) = slot.borrow().as_ref() {
        let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
    }
}

#[derive(Serialize)]
struct ChartBarJson {
    label: &'static str,
    color: &'static str,
    count: u64,
}

#[derive(Serialize)]
struct DashboardSnapshot<'a> {
    top: &'a [compute::ShelterLoad],
    summary: compute::RegionSummary,
    summary_class: &'static str,
    chart: Vec<ChartBarJson>,
    pet_cards: &'a [formats::AnimalRecord],
}

/// The derived dashboard data as JSON for the page's card and chart widgets.
/// `null` until [`load_dashboard`] has finished.
#[wasm_bindgen]
pub fn dashboard_json() -> Result<String, JsValue> {
    STATE.with(|state| {
        let guard = state.borrow();
        let Some((s, data)) = guard.as_ref().and_then(|s| s.data.as_ref().map(|d| (s, d))) else {
            return Ok("null".to_string());
        };
        let snapshot = DashboardSnapshot {
            top: &data.top,
            summary: data.summary,
            summary_class: data.summary_class(&s.config).card_css(),
            chart: data
                .outcomes
                .bars()
                .iter()
                .map(|b| ChartBarJson {
                    label: b.label,
                    color: b.color,
                    count: b.count,
                })
                .collect(),
            pet_cards: data.pet_cards(s.config.pet_card_limit),
        };
        serde_json::to_string(&snapshot).map_err(|e| JsValue::from_str(&e.to_string()))
    })
}
