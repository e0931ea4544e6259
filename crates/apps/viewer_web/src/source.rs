use formats::{GeoSource, LocalBoxFuture, SourceError};
use gloo_net::http::Request;

/// Browser `fetch` through gloo-net. Non-2xx answers are errors.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooSource;

impl GeoSource for GlooSource {
    fn fetch_text<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<String, SourceError>> {
        Box::pin(async move {
            let network = |e: gloo_net::Error| SourceError::Network {
                url: url.to_string(),
                message: e.to_string(),
            };
            let resp = Request::get(url).send().await.map_err(network)?;
            if !resp.ok() {
                return Err(SourceError::Status {
                    url: url.to_string(),
                    status: resp.status(),
                });
            }
            resp.text().await.map_err(network)
        })
    }
}
