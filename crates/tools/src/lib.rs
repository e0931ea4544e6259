//! Headless map rendering and feed statistics for the `rescue-atlas` CLI.

use std::cell::RefCell;

use dashboard::{DashboardConfig, DashboardData, LoadError, MapComponent, load_current, load_view};
use formats::{FeedError, GeoSource, LocalBoxFuture, ShelterFeed, SourceError};
use layers::{Painter, SvgPainter};
use runtime::ManualFrameHost;
use scene::{ValueTable, ViewState};
use serde::Serialize;
use tracing::{debug, info};

/// Frames pumped before giving up on an animation that will not settle.
const MAX_FRAMES: usize = 1000;

#[derive(Debug)]
pub enum ToolError {
    Load(LoadError),
    Source(SourceError),
    Feed(FeedError),
    Config(dashboard::ConfigError),
    Io(std::io::Error),
    Json(serde_json::Error),
    UnknownRegion(String),
    /// A load finished but a newer one had replaced it.
    Superseded,
}

impl std::fmt::Display for ToolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolError::Load(e) => write!(f, "map load failed: {e}"),
            ToolError::Source(e) => write!(f, "{e}"),
            ToolError::Feed(e) => write!(f, "{e}"),
            ToolError::Config(e) => write!(f, "{e}"),
            ToolError::Io(e) => write!(f, "I/O error: {e}"),
            ToolError::Json(e) => write!(f, "JSON error: {e}"),
            ToolError::UnknownRegion(name) => write!(f, "no region named {name:?} in the loaded map"),
            ToolError::Superseded => write!(f, "map load was superseded"),
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Load(e) => Some(e),
            ToolError::Source(e) => Some(e),
            ToolError::Feed(e) => Some(e),
            ToolError::Config(e) => Some(e),
            ToolError::Io(e) => Some(e),
            ToolError::Json(e) => Some(e),
            ToolError::UnknownRegion(_) | ToolError::Superseded => None,
        }
    }
}

impl From<LoadError> for ToolError {
    fn from(e: LoadError) -> Self {
        ToolError::Load(e)
    }
}

impl From<SourceError> for ToolError {
    fn from(e: SourceError) -> Self {
        ToolError::Source(e)
    }
}

impl From<FeedError> for ToolError {
    fn from(e: FeedError) -> Self {
        ToolError::Feed(e)
    }
}

impl From<dashboard::ConfigError> for ToolError {
    fn from(e: dashboard::ConfigError) -> Self {
        ToolError::Config(e)
    }
}

impl From<std::io::Error> for ToolError {
    fn from(e: std::io::Error) -> Self {
        ToolError::Io(e)
    }
}

/// HTTP fetches through reqwest. Non-2xx answers are errors.
#[derive(Debug, Clone, Default)]
pub struct ReqwestSource {
    client: reqwest::Client,
}

impl ReqwestSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl GeoSource for ReqwestSource {
    fn fetch_text<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String, SourceError>> {
        Box::pin(async move {
            let network = |e: reqwest::Error| SourceError::Network {
                url: url.to_string(),
                message: e.to_string(),
            };
            let resp = self.client.get(url).send().await.map_err(network)?;
            let status = resp.status();
            if !status.is_success() {
                return Err(SourceError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }
            resp.text().await.map_err(network)
        })
    }
}

/// What to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderRequest {
    pub view: ViewState,
    /// Region to lift, by display name.
    pub hover: Option<String>,
    pub width: u32,
    pub height: u32,
    /// Drill-down overrides, usually the feed's city pressure table.
    pub overrides: Option<ValueTable>,
}

/// Run frames until the animation stops. Returns how many frames ran.
pub fn settle<P: Painter + ?Sized>(
    component: &RefCell<MapComponent>,
    host: &ManualFrameHost,
    painter: &mut P,
) -> usize {
    let mut frames = 0;
    while let Some(handle) = host.take_next() {
        component.borrow_mut().on_frame(handle, painter);
        frames += 1;
        if frames >= MAX_FRAMES {
            break;
        }
    }
    debug!(frames, "animation settled");
    frames
}

/// Load the requested view, settle the hover animation and return the frame
/// as an SVG document.
pub async fn render_svg<S>(source: &S, config: &DashboardConfig, request: &RenderRequest) -> Result<String, ToolError>
where
    S: GeoSource + ?Sized,
{
    let host = ManualFrameHost::new();
    let component = RefCell::new(
        MapComponent::new(
            config.views.clone(),
            Box::new(host.clone()),
            f64::from(request.width),
            f64::from(request.height),
        )
        .with_tooltip_offset(config.tooltip_offset()),
    );
    if let Some(table) = &request.overrides {
        component.borrow_mut().set_override_table(table.clone());
    }

    applied(load_current(&component, source).await?)?;
    if request.view == ViewState::DrillDown {
        let region = &config.views.drill_down_region;
        if !component.borrow_mut().set_hover(Some(region.as_str())) {
            return Err(ToolError::UnknownRegion(region.clone()));
        }
        let ticket = component.borrow_mut().click();
        if let Some(ticket) = ticket {
            applied(load_view(&component, source, ticket).await?)?;
        }
    }

    if let Some(name) = &request.hover {
        if !component.borrow_mut().set_hover(Some(name.as_str())) {
            return Err(ToolError::UnknownRegion(name.clone()));
        }
    }

    let mut svg = SvgPainter::new();
    settle(&component, &host, &mut svg);
    // Draw the settled frame even if nothing was animating.
    component.borrow().render(&mut svg);
    info!(
        regions = component.borrow().model().len(),
        paths = svg.element_count(),
        "map rendered"
    );
    Ok(svg.finish())
}

fn applied(outcome: dashboard::LoadOutcome) -> Result<(), ToolError> {
    match outcome {
        dashboard::LoadOutcome::Applied { .. } => Ok(()),
        dashboard::LoadOutcome::Stale => Err(ToolError::Superseded),
    }
}

/// Fetch and parse the shelter feed.
pub async fn fetch_feed<S>(source: &S, url: &str) -> Result<ShelterFeed, ToolError>
where
    S: GeoSource + ?Sized,
{
    let text = source.fetch_text(url).await?;
    Ok(ShelterFeed::from_json_str(&text)?)
}

#[derive(Debug, Serialize)]
struct StatsJson<'a> {
    summary: compute::RegionSummary,
    summary_class: &'static str,
    top: &'a [compute::ShelterLoad],
    outcomes: compute::ProcessStateCounts,
    city_pressure: &'a ValueTable,
    protected: usize,
}

pub fn stats_json(data: &DashboardData, config: &DashboardConfig) -> Result<String, ToolError> {
    let out = StatsJson {
        summary: data.summary,
        summary_class: data.summary_class(config).card_css(),
        top: &data.top,
        outcomes: data.outcomes,
        city_pressure: &data.city_pressure,
        protected: data.protected.len(),
    };
    serde_json::to_string_pretty(&out).map_err(ToolError::Json)
}

/// Plain-text report of the derived dashboard numbers.
pub fn stats_report(data: &DashboardData, config: &DashboardConfig) -> String {
    let s = &data.summary;
    let mut out = String::new();
    out.push_str(&format!("{} summary\n", config.region));
    out.push_str(&format!("  capacity        {}\n", compute::format_grouped(s.total_capacity)));
    out.push_str(&format!("  in care         {}\n", compute::format_grouped(s.notice_count)));
    out.push_str(&format!(
        "  pressure        {}% ({})\n",
        s.total_pressure,
        data.summary_class(config).card_css()
    ));
    out.push_str(&format!("  shelters        {}\n", s.total_shelters));
    out.push_str(&format!("  vets            {}\n", s.vet_person_cnt));
    out.push_str(&format!("  specialists     {}\n", s.specs_person_cnt));

    out.push_str(&format!("\ntop {} shelters by pressure\n", data.top.len()));
    for (rank, shelter) in data.top.iter().enumerate() {
        let class = compute::PressureClass::for_progress(shelter.pressure, config.thresholds);
        out.push_str(&format!(
            "  {}. {} {}/{} {}% [{}]\n",
            rank + 1,
            shelter.name,
            shelter.count,
            shelter.capacity,
            shelter.pressure,
            class.progress_css()
        ));
    }

    out.push_str("\nlast 30 days\n");
    for bar in data.outcomes.bars() {
        out.push_str(&format!("  {} {}\n", bar.label, bar.count));
    }

    out.push_str("\ncity pressure\n");
    for (city, value) in data.city_pressure.iter() {
        out.push_str(&format!("  {city} {value}%\n"));
    }
    out
}
