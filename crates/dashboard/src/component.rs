use std::cell::RefCell;

use formats::{BoundaryCollection, GeoSource, LoadError, fetch_features};
use foundation::math::{FitProjector, Vec2};
use layers::{Painter, Renderer};
use runtime::{EventBus, FrameHandle, FrameHost, FrameScheduler, Generation, GenerationCounter, SubscriptionId};
use scene::{
    AnimationLoop, CanvasRect, MapModel, TOOLTIP_OFFSET, Tick, Tooltip, ValueTable, ViewBinding, ViewConfig,
    ViewController, ViewState, pick_region, viewport_to_canvas,
};
use tracing::{debug, error, info, warn};

/// Notifications published by a [`MapComponent`].
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    HoverChanged { hovered: Option<String> },
    ViewChanged { state: ViewState },
    Loaded { generation: Generation, state: ViewState, regions: usize },
    LoadFailed { generation: Generation, message: String },
    StaleLoadDiscarded { generation: Generation },
}

/// Proof that a load was started; hand it back to [`MapComponent::finish_load`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: Generation,
    pub binding: ViewBinding,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied { regions: usize },
    /// A newer load was started meanwhile; nothing changed.
    Stale,
}

/// The interactive map: owns its regions, hover state, view state, frame
/// scheduling and load generations.
///
/// Event listeners run while the component is mutably borrowed, so a listener
/// must not reach back into the component.
pub struct MapComponent {
    view: ViewController,
    model: MapModel,
    hovered: Option<String>,
    generations: GenerationCounter,
    scheduler: FrameScheduler,
    animation: AnimationLoop,
    renderer: Renderer,
    events: EventBus<MapEvent>,
    tooltip_offset: Vec2,
    width: f64,
    height: f64,
}

impl MapComponent {
    pub fn new(views: ViewConfig, host: Box<dyn FrameHost>, width: f64, height: f64) -> Self {
        Self {
            view: ViewController::new(views),
            model: MapModel::new(),
            hovered: None,
            generations: GenerationCounter::new(),
            scheduler: FrameScheduler::new(host),
            animation: AnimationLoop::default(),
            renderer: Renderer::new(),
            events: EventBus::new(),
            tooltip_offset: TOOLTIP_OFFSET,
            width,
            height,
        }
    }

    pub fn with_tooltip_offset(mut self, offset: Vec2) -> Self {
        self.tooltip_offset = offset;
        self
    }

    pub fn state(&self) -> ViewState {
        self.view.state()
    }

    pub fn model(&self) -> &MapModel {
        &self.model
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn is_animating(&self) -> bool {
        self.scheduler.is_pending()
    }

    /// Handle of the frame the host owes us, for hosts whose callbacks do
    /// not carry it.
    pub fn pending_frame(&self) -> Option<FrameHandle> {
        self.scheduler.pending()
    }

    /// Projection for the current frame, if anything is loaded.
    pub fn projector(&self) -> Option<FitProjector> {
        FitProjector::new(self.model.extent()?, self.width, self.height)
    }

    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&MapEvent) + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Start loading the current view.
    pub fn begin_current_load(&mut self) -> LoadTicket {
        let binding = self.view.binding();
        self.begin_load(binding)
    }

    /// Reset for a new load: cancel the pending frame, drop every region and
    /// the hover, and issue a new generation. Results of earlier tickets will
    /// be discarded.
    pub fn begin_load(&mut self, binding: ViewBinding) -> LoadTicket {
        self.scheduler.cancel();
        self.model.clear();
        if self.hovered.take().is_some() {
            self.events.emit(&MapEvent::HoverChanged { hovered: None });
        }
        let generation = self.generations.advance();
        debug!(%generation, url = %binding.url, "load started");
        LoadTicket { generation, binding }
    }

    /// Apply a fetch result for `ticket`.
    ///
    /// A stale ticket changes nothing, whether its fetch succeeded or not. A
    /// failed current load leaves the map empty and is returned to the caller.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<BoundaryCollection, LoadError>,
    ) -> Result<LoadOutcome, LoadError> {
        let generation = ticket.generation;
        if !self.generations.is_current(generation) {
            warn!(%generation, "discarding stale load");
            self.events.emit(&MapEvent::StaleLoadDiscarded { generation });
            return Ok(LoadOutcome::Stale);
        }

        let collection = match result {
            Ok(c) => c,
            Err(e) => {
                error!(%generation, url = %ticket.binding.url, "map load failed: {e}");
                self.events.emit(&MapEvent::LoadFailed {
                    generation,
                    message: e.to_string(),
                });
                return Err(e);
            }
        };

        self.model = MapModel::from_features(&collection.features, &ticket.binding.table);
        let regions = self.model.len();
        info!(%generation, state = ?ticket.binding.state, regions, "map loaded");
        self.scheduler.request();
        self.events.emit(&MapEvent::Loaded {
            generation,
            state: ticket.binding.state,
            regions,
        });
        Ok(LoadOutcome::Applied { regions })
    }

    /// Hover hit-test for a pointer at viewport position `client` over a
    /// canvas displayed at `rect`. Returns the tooltip to show, if any.
    pub fn pointer_move(&mut self, client: Vec2, rect: CanvasRect) -> Option<Tooltip> {
        let point = viewport_to_canvas(client, rect, self.width, self.height);
        let hit = self
            .projector()
            .and_then(|projector| pick_region(&self.model, &projector, point))
            .map(|region| Tooltip::for_region(region, client, self.tooltip_offset));
        self.set_hovered(hit.as_ref().map(|t| t.name.clone()));
        hit
    }

    /// Pointer left the canvas.
    pub fn pointer_leave(&mut self) {
        self.set_hovered(None);
    }

    /// Hover a region by id without a pointer. Returns `false` (and leaves the
    /// hover alone) when no loaded region has that id.
    pub fn set_hover(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.model.region(id).is_none() => false,
            _ => {
                self.set_hovered(id.map(str::to_string));
                true
            }
        }
    }

    fn set_hovered(&mut self, hovered: Option<String>) {
        if self.hovered == hovered {
            return;
        }
        self.hovered = hovered;
        self.scheduler.request();
        self.events.emit(&MapEvent::HoverChanged {
            hovered: self.hovered.clone(),
        });
    }

    /// Apply a click at the current hover. Returns the load to run when the
    /// view changed.
    pub fn click(&mut self) -> Option<LoadTicket> {
        let binding = self.view.on_click(self.hovered.as_deref())?;
        self.events.emit(&MapEvent::ViewChanged { state: binding.state });
        Some(self.begin_load(binding))
    }

    /// Replace the drill-down value overrides.
    ///
    /// Future drill-down loads use the new values; a drill-down map already on
    /// screen is re-resolved in place.
    pub fn set_override_table(&mut self, table: ValueTable) {
        self.view.set_override_table(table);
        if self.view.state() != ViewState::DrillDown || self.model.is_empty() {
            return;
        }
        let resolved = self.view.binding().table;
        for region in self.model.regions_mut() {
            region.value = resolved.resolve(&region.id);
        }
        self.scheduler.request();
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.scheduler.request();
    }

    /// Run one animation frame delivered by the host.
    ///
    /// Stale handles (cancelled or superseded) do nothing and report `Stop`.
    pub fn on_frame<P: Painter + ?Sized>(&mut self, handle: FrameHandle, painter: &mut P) -> Tick {
        if !self.scheduler.fire(handle) {
            return Tick::Stop;
        }
        let tick = self.animation.step(self.model.regions_mut(), self.hovered.as_deref());
        self.render(painter);
        if tick == Tick::Continue {
            self.scheduler.request();
        }
        tick
    }

    pub fn render<P: Painter + ?Sized>(&self, painter: &mut P) -> bool {
        self.renderer.render(painter, &self.model, self.width, self.height)
    }

    /// Stop animating and forget the loaded map; in-flight loads become stale.
    pub fn teardown(&mut self) {
        self.scheduler.cancel();
        self.model.clear();
        self.hovered = None;
        self.generations.advance();
    }
}

impl std::fmt::Debug for MapComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapComponent")
            .field("state", &self.view.state())
            .field("regions", &self.model.len())
            .field("hovered", &self.hovered)
            .field("generation", &self.generations.current())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}

/// Fetch and apply one load. The component is only borrowed before and after
/// the fetch, never across it.
pub async fn load_view<S>(
    component: &RefCell<MapComponent>,
    source: &S,
    ticket: LoadTicket,
) -> Result<LoadOutcome, LoadError>
where
    S: GeoSource + ?Sized,
{
    let result = fetch_features(source, &ticket.binding.url, ticket.binding.filter.as_ref()).await;
    component.borrow_mut().finish_load(ticket, result)
}

/// Start and run a load of the component's current view.
pub async fn load_current<S>(component: &RefCell<MapComponent>, source: &S) -> Result<LoadOutcome, LoadError>
where
    S: GeoSource + ?Sized,
{
    let ticket = component.borrow_mut().begin_current_load();
    load_view(component, source, ticket).await
}

#[cfg(test)]
mod tests {
    use super::{LoadOutcome, MapComponent, MapEvent, load_current, load_view};
    use formats::{LoadError, SourceError, StaticSource};
    use foundation::math::Vec2;
    use layers::RecordingPainter;
    use pretty_assertions::assert_eq;
    use runtime::ManualFrameHost;
    use scene::{CanvasRect, Tick, ValueTable, ViewConfig, ViewState};
    use std::cell::RefCell;
    use std::rc::Rc;

    const SIDO: &str = "mem://sido";
    const SIGUNGU: &str = "mem://sigungu";

    const SIDO_BODY: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"서울특별시"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[2,0],[2,2],[0,2]]]}},
        {"type":"Feature","properties":{"name":"경기도"},
         "geometry":{"type":"Polygon","coordinates":[[[2,0],[10,0],[10,8],[2,8]]]}}
    ]}"#;

    const SIGUNGU_BODY: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"수원시","code":"31010"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[4,0],[4,4],[0,4]]]}},
        {"type":"Feature","properties":{"name":"포천시","code":"31270"},
         "geometry":{"type":"Polygon","coordinates":[[[4,0],[8,0],[8,4],[4,4]]]}},
        {"type":"Feature","properties":{"name":"종로구","code":"11010"},
         "geometry":{"type":"Polygon","coordinates":[[[20,20],[21,20],[21,21]]]}}
    ]}"#;

    const RECT: CanvasRect = CanvasRect {
        left: 0.0,
        top: 0.0,
        width: 800.0,
        height: 600.0,
    };

    fn views() -> ViewConfig {
        ViewConfig {
            overview_url: SIDO.to_string(),
            drill_down_url: SIGUNGU.to_string(),
            ..ViewConfig::default()
        }
    }

    fn source() -> StaticSource {
        StaticSource::new()
            .with_body(SIDO, SIDO_BODY)
            .with_body(SIGUNGU, SIGUNGU_BODY)
    }

    fn component(host: &ManualFrameHost) -> RefCell<MapComponent> {
        RefCell::new(MapComponent::new(views(), Box::new(host.clone()), 800.0, 600.0))
    }

    fn ids(c: &RefCell<MapComponent>) -> Vec<String> {
        c.borrow().model().regions().iter().map(|r| r.id.clone()).collect()
    }

    /// Client position over the given geographic point.
    fn over(c: &RefCell<MapComponent>, lng: f64, lat: f64) -> Vec2 {
        c.borrow().projector().expect("loaded").project(lng, lat)
    }

    fn pump(c: &RefCell<MapComponent>, host: &ManualFrameHost, painter: &mut RecordingPainter) -> usize {
        let mut frames = 0;
        while let Some(handle) = host.take_next() {
            c.borrow_mut().on_frame(handle, painter);
            frames += 1;
            assert!(frames < 50, "animation did not settle");
        }
        frames
    }

    #[test]
    fn overview_load_builds_regions_and_starts_a_frame() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let outcome = pollster::block_on(load_current(&c, &source())).expect("load");
        assert_eq!(outcome, LoadOutcome::Applied { regions: 2 });
        assert_eq!(ids(&c), vec!["서울특별시", "경기도"]);
        assert_eq!(c.borrow().model().region("서울특별시").map(|r| r.value), Some(94));
        assert_eq!(host.outstanding(), 1);
    }

    #[test]
    fn later_load_wins_even_if_it_finishes_first() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let src = source();

        let first = c.borrow_mut().begin_current_load();
        let mut second_binding = first.binding.clone();
        second_binding.url = SIGUNGU.to_string();
        let second = c.borrow_mut().begin_load(second_binding);

        let applied = pollster::block_on(load_view(&c, &src, second)).expect("second");
        assert_eq!(applied, LoadOutcome::Applied { regions: 3 });
        let stale = pollster::block_on(load_view(&c, &src, first)).expect("first");
        assert_eq!(stale, LoadOutcome::Stale);

        assert_eq!(ids(&c), vec!["수원시", "포천시", "종로구"]);
    }

    #[test]
    fn stale_failure_is_ignored_too() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let first = c.borrow_mut().begin_current_load();
        let second = c.borrow_mut().begin_current_load();
        pollster::block_on(load_view(&c, &source(), second)).expect("second");

        let err = LoadError::Network(SourceError::Status {
            url: SIDO.to_string(),
            status: 500,
        });
        let outcome = c.borrow_mut().finish_load(first, Err(err));
        assert_eq!(outcome, Ok(LoadOutcome::Stale));
        assert_eq!(c.borrow().model().len(), 2);
    }

    #[test]
    fn failed_load_leaves_an_empty_map_and_reports() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        c.borrow_mut().subscribe(move |e| sink.borrow_mut().push(e.clone()));

        let err = pollster::block_on(load_current(&c, &StaticSource::new())).unwrap_err();
        assert!(matches!(err, LoadError::Network(SourceError::Status { status: 404, .. })));
        assert!(c.borrow().model().is_empty());
        assert!(c.borrow().projector().is_none());
        assert!(!c.borrow().render(&mut RecordingPainter::new()));
        assert!(matches!(events.borrow().last(), Some(MapEvent::LoadFailed { .. })));
    }

    #[test]
    fn new_load_cancels_the_pending_frame_and_hover() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        pollster::block_on(load_current(&c, &source())).expect("load");
        let p = over(&c, 6.0, 4.0);
        c.borrow_mut().pointer_move(p, RECT);
        assert_eq!(c.borrow().hovered(), Some("경기도"));
        assert!(c.borrow().is_animating());

        c.borrow_mut().begin_current_load();
        assert_eq!(host.cancelled(), 1);
        assert_eq!(host.outstanding(), 0);
        assert_eq!(c.borrow().hovered(), None);
        assert!(c.borrow().model().is_empty());
    }

    #[test]
    fn hover_lifts_region_until_settled_then_stops() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        pollster::block_on(load_current(&c, &source())).expect("load");
        let mut painter = RecordingPainter::new();
        pump(&c, &host, &mut painter);

        let p = over(&c, 6.0, 4.0);
        let tip = c.borrow_mut().pointer_move(p, RECT).expect("tooltip");
        assert_eq!(tip.name, "경기도");
        assert_eq!(tip.text(), "수용 상태 : 38% 사용중");
        assert_eq!((tip.left, tip.top), (p.x + 48.0, p.y - 38.0));

        let frames = pump(&c, &host, &mut painter);
        assert!(frames > 1);
        let lifted = c.borrow().model().region("경기도").map(|r| r.current_height);
        assert_eq!(lifted, Some(10.0));
        assert!(!c.borrow().is_animating());

        // Settled: one more frame reports Stop and schedules nothing.
        c.borrow_mut().resize(800.0, 600.0);
        let handle = host.take_next().expect("frame");
        assert_eq!(c.borrow_mut().on_frame(handle, &mut painter), Tick::Stop);
        assert_eq!(host.outstanding(), 0);
    }

    #[test]
    fn click_drills_down_and_background_click_returns() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let src = source();
        pollster::block_on(load_current(&c, &src)).expect("load");

        // Clicking another province does nothing.
        let seoul = over(&c, 1.0, 1.0);
        c.borrow_mut().pointer_move(seoul, RECT);
        assert!(c.borrow_mut().click().is_none());

        let gyeonggi = over(&c, 6.0, 4.0);
        c.borrow_mut().pointer_move(gyeonggi, RECT);
        let ticket = c.borrow_mut().click().expect("drill down");
        assert_eq!(c.borrow().state(), ViewState::DrillDown);
        assert_eq!(ticket.binding.url, SIGUNGU);
        pollster::block_on(load_view(&c, &src, ticket)).expect("drill-down load");
        assert_eq!(ids(&c), vec!["수원시", "포천시"]);
        assert_eq!(c.borrow().model().region("포천시").map(|r| r.value), Some(99));

        // Hovering a city and clicking stays put.
        let suwon = over(&c, 2.0, 2.0);
        c.borrow_mut().pointer_move(suwon, RECT);
        assert!(c.borrow_mut().click().is_none());

        c.borrow_mut().pointer_move(Vec2::new(1.0, 1.0), RECT);
        assert_eq!(c.borrow().hovered(), None);
        let ticket = c.borrow_mut().click().expect("back to overview");
        assert_eq!(ticket.binding.url, SIDO);
        assert_eq!(ticket.binding.filter, None);
        pollster::block_on(load_view(&c, &src, ticket)).expect("overview load");
        assert_eq!(c.borrow().state(), ViewState::Overview);
        assert_eq!(ids(&c), vec!["서울특별시", "경기도"]);
    }

    #[test]
    fn override_table_reaches_drill_down_values() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let src = source();
        let overrides: ValueTable = [("수원시", 12)].into_iter().collect();
        c.borrow_mut().set_override_table(overrides);

        pollster::block_on(load_current(&c, &src)).expect("load");
        let p = over(&c, 6.0, 4.0);
        c.borrow_mut().pointer_move(p, RECT);
        let ticket = c.borrow_mut().click().expect("drill down");
        pollster::block_on(load_view(&c, &src, ticket)).expect("load");
        assert_eq!(c.borrow().model().region("수원시").map(|r| r.value), Some(12));

        // Late overrides update the map on screen.
        let later: ValueTable = [("포천시", 7)].into_iter().collect();
        c.borrow_mut().set_override_table(later);
        assert_eq!(c.borrow().model().region("포천시").map(|r| r.value), Some(7));
        assert_eq!(c.borrow().model().region("수원시").map(|r| r.value), Some(85));
    }

    #[test]
    fn hover_changes_are_published() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        pollster::block_on(load_current(&c, &source())).expect("load");
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let id = c.borrow_mut().subscribe(move |e| {
            if let MapEvent::HoverChanged { hovered } = e {
                sink.borrow_mut().push(hovered.clone());
            }
        });

        let p = over(&c, 1.0, 1.0);
        c.borrow_mut().pointer_move(p, RECT);
        c.borrow_mut().pointer_move(p, RECT);
        c.borrow_mut().pointer_leave();
        assert!(c.borrow_mut().unsubscribe(id));
        c.borrow_mut().pointer_move(p, RECT);

        assert_eq!(*seen.borrow(), vec![Some("서울특별시".to_string()), None]);
    }

    #[test]
    fn programmatic_hover_needs_a_loaded_region() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        assert!(!c.borrow_mut().set_hover(Some("경기도")));
        pollster::block_on(load_current(&c, &source())).expect("load");
        assert!(!c.borrow_mut().set_hover(Some("없는도")));
        assert!(c.borrow_mut().set_hover(Some("경기도")));
        assert_eq!(c.borrow().hovered(), Some("경기도"));
        assert!(c.borrow_mut().set_hover(None));
        assert_eq!(c.borrow().hovered(), None);
    }

    #[test]
    fn teardown_makes_in_flight_loads_stale() {
        let host = ManualFrameHost::new();
        let c = component(&host);
        let ticket = c.borrow_mut().begin_current_load();
        c.borrow_mut().teardown();
        let outcome = pollster::block_on(load_view(&c, &source(), ticket)).expect("load");
        assert_eq!(outcome, LoadOutcome::Stale);
        assert!(c.borrow().model().is_empty());
    }
}
