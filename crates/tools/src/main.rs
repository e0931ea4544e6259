use std::env;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use dashboard::{DashboardConfig, DashboardData};
use reqwest::Client;
use scene::ViewState;
use tools::{RenderRequest, ReqwestSource, fetch_feed, render_svg, stats_json, stats_report};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Shelter-pressure map renderer and feed statistics")]
struct Args {
    /// Dashboard config JSON; any field may be omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shelter feed URL (default: RESCUE_FEED_URL or the built-in feed)
    #[arg(long)]
    feed_url: Option<String>,

    /// Province boundary GeoJSON URL (default: RESCUE_OVERVIEW_URL)
    #[arg(long)]
    overview_url: Option<String>,

    /// Municipality boundary GeoJSON URL (default: RESCUE_DRILL_DOWN_URL)
    #[arg(long)]
    drill_down_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Copy, Clone)]
enum View {
    Overview,
    DrillDown,
}

impl From<View> for ViewState {
    fn from(v: View) -> Self {
        match v {
            View::Overview => ViewState::Overview,
            View::DrillDown => ViewState::DrillDown,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one settled map frame as SVG
    Render {
        #[arg(long, value_enum, default_value_t = View::Overview)]
        view: View,

        /// Region to lift, by display name
        #[arg(long)]
        hover: Option<String>,

        #[arg(long, default_value_t = 800)]
        width: u32,

        #[arg(long, default_value_t = 600)]
        height: u32,

        /// Output file (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Fetch the shelter feed and use its city pressure for the drill-down
        #[arg(long)]
        with_feed: bool,
    },

    /// Print the dashboard numbers derived from the shelter feed
    Stats {
        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Reference day for the recent-outcome window, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn override_url(target: &mut String, flag: Option<String>, var: &str) {
    if let Some(url) = flag.or_else(|| env::var(var).ok()) {
        *target = url;
    }
}

async fn load_config(args: &mut Args) -> Result<DashboardConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => {
            let text = tokio::fs::read_to_string(path).await?;
            DashboardConfig::from_json_str(&text)?
        }
        None => DashboardConfig::default(),
    };
    override_url(&mut config.feed_url, args.feed_url.take(), "RESCUE_FEED_URL");
    override_url(&mut config.views.overview_url, args.overview_url.take(), "RESCUE_OVERVIEW_URL");
    override_url(
        &mut config.views.drill_down_url,
        args.drill_down_url.take(),
        "RESCUE_DRILL_DOWN_URL",
    );
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = Args::parse();
    let config = load_config(&mut args).await?;
    let source = ReqwestSource::new(Client::new());

    match args.command {
        Command::Render {
            view,
            hover,
            width,
            height,
            out,
            with_feed,
        } => {
            let overrides = if with_feed {
                let feed = fetch_feed(&source, &config.feed_url).await?;
                let today = chrono::Local::now().date_naive();
                Some(DashboardData::from_feed(&feed, &config, today).city_pressure)
            } else {
                None
            };
            let request = RenderRequest {
                view: view.into(),
                hover,
                width,
                height,
                overrides,
            };
            let svg = match render_svg(&source, &config, &request).await {
                Ok(svg) => svg,
                Err(e) => {
                    error!("render failed: {e}");
                    return Err(e.into());
                }
            };
            match out {
                Some(path) => {
                    tokio::fs::write(&path, svg).await?;
                    info!(path = %path.display(), "svg written");
                }
                None => print!("{svg}"),
            }
        }
        Command::Stats { json, date } => {
            let feed = fetch_feed(&source, &config.feed_url).await?;
            let today = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let data = DashboardData::from_feed(&feed, &config, today);
            if json {
                println!("{}", stats_json(&data, &config)?);
            } else {
                print!("{}", stats_report(&data, &config));
            }
        }
    }

    Ok(())
}
