//! Fetch seam for boundary data.
//!
//! The browser fetches through gloo-net, the CLI through reqwest; both sit
//! behind [`GeoSource`] so loading logic can be driven by [`StaticSource`] in
//! tests. Futures are not `Send`: everything runs on one thread.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::boundary::{BoundaryCollection, BoundaryError, FeatureFilter};

/// Boxed future that stays on the current thread.
pub type LocalBoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq)]
pub enum SourceError {
    /// The request never produced a response.
    Network { url: String, message: String },
    /// The server answered with a non-success status.
    Status { url: String, status: u16 },
}

impl std::fmt::Display for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceError::Network { url, message } => write!(f, "fetch {url} failed: {message}"),
            SourceError::Status { url, status } => write!(f, "fetch {url} returned HTTP {status}"),
        }
    }
}

impl std::error::Error for SourceError {}

/// Why a boundary load produced no regions.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    Network(SourceError),
    Parse(BoundaryError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Network(e) => write!(f, "network error: {e}"),
            LoadError::Parse(e) => write!(f, "parse error: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Network(e) => Some(e),
            LoadError::Parse(e) => Some(e),
        }
    }
}

impl From<SourceError> for LoadError {
    fn from(e: SourceError) -> Self {
        LoadError::Network(e)
    }
}

impl From<BoundaryError> for LoadError {
    fn from(e: BoundaryError) -> Self {
        LoadError::Parse(e)
    }
}

/// Anything that can GET a URL and hand back the body text.
pub trait GeoSource {
    fn fetch_text<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String, SourceError>>;
}

/// Fetch a boundary collection and apply the optional filter.
pub async fn fetch_features<S>(
    source: &S,
    url: &str,
    filter: Option<&FeatureFilter>,
) -> Result<BoundaryCollection, LoadError>
where
    S: GeoSource + ?Sized,
{
    let text = source.fetch_text(url).await?;
    let mut collection = BoundaryCollection::from_geojson_str(&text)?;
    let fetched = collection.features.len();
    if let Some(filter) = filter {
        collection.retain_matching(filter);
    }
    debug!(
        url,
        fetched,
        kept = collection.features.len(),
        "boundary features fetched"
    );
    Ok(collection)
}

/// In-memory source: fixed bodies per URL, everything else is a 404.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    bodies: HashMap<String, Result<String, SourceError>>,
}

impl StaticSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.bodies.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_error(mut self, url: impl Into<String>, err: SourceError) -> Self {
        self.bodies.insert(url.into(), Err(err));
        self
    }
}

impl GeoSource for StaticSource {
    fn fetch_text<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String, SourceError>> {
        let result = self.bodies.get(url).cloned().unwrap_or_else(|| {
            Err(SourceError::Status {
                url: url.to_string(),
                status: 404,
            })
        });
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadError, SourceError, StaticSource, fetch_features};
    use crate::boundary::FeatureFilter;

    const TWO: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","properties":{"name":"a","code":"31010"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1]]]}},
        {"type":"Feature","properties":{"name":"b","code":"11010"},
         "geometry":{"type":"Polygon","coordinates":[[[0,0],[1,0],[1,1]]]}}
    ]}"#;

    #[test]
    fn fetches_and_filters() {
        let src = StaticSource::new().with_body("mem://two", TWO);
        let all = pollster::block_on(fetch_features(&src, "mem://two", None)).expect("load");
        assert_eq!(all.features.len(), 2);

        let filter = FeatureFilter::code_prefix("code", "31");
        let some =
            pollster::block_on(fetch_features(&src, "mem://two", Some(&filter))).expect("load");
        assert_eq!(some.features.len(), 1);
        assert_eq!(some.features[0].display_name(), Some("a"));
    }

    #[test]
    fn unknown_url_is_a_network_failure() {
        let src = StaticSource::new();
        let err = pollster::block_on(fetch_features(&src, "mem://missing", None)).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Network(SourceError::Status { status: 404, .. })
        ));
    }

    #[test]
    fn bad_body_is_a_parse_failure() {
        let src = StaticSource::new().with_body("mem://bad", "<html>");
        let err = pollster::block_on(fetch_features(&src, "mem://bad", None)).unwrap_err();
        assert!(matches!(err, LoadError::Parse(_)));
    }

    #[test]
    fn configured_error_is_returned() {
        let src = StaticSource::new().with_error(
            "mem://down",
            SourceError::Network {
                url: "mem://down".to_string(),
                message: "connection refused".to_string(),
            },
        );
        let err = pollster::block_on(fetch_features(&src, "mem://down", None)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "network error: fetch mem://down failed: connection refused"
        );
    }
}
