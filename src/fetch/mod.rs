// src/fetch/mod.rs

pub mod envelope;

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;
use url::Url;

/// data.gov.sg CKAN action endpoints.
const DATA_ENDPOINT: &str = "https://data.gov.sg/api/action/datastore_search";
const META_ENDPOINT: &str = "https://data.gov.sg/api/action/resource_show";

/// Fixed User-Agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/41.0.2228.0 Safari/537.3";

/// Fixed page size. The API is only ever asked for the first page; the data
/// route's descending datetime sort keeps that page newest-first.
pub const PAGE_LIMIT: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Data,
    Meta,
}

/// Endpoint pair for the two routes. Defaults to the public API; tests point
/// it at a local stand-in server instead.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub data: String,
    pub meta: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            data: DATA_ENDPOINT.to_string(),
            meta: META_ENDPOINT.to_string(),
        }
    }
}

impl Endpoints {
    /// Both action endpoints under one base URL.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Endpoints {
            data: format!("{base}/datastore_search"),
            meta: format!("{base}/resource_show"),
        }
    }

    fn for_route(&self, route: Route) -> &str {
        match route {
            Route::Data => &self.data,
            Route::Meta => &self.meta,
        }
    }
}

impl Route {
    fn id_param(self) -> &'static str {
        match self {
            Route::Data => "resource_id",
            Route::Meta => "id",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Route::Data => "data",
            Route::Meta => "metadata",
        }
    }
}

/// HTTP client with the fixed User-Agent applied to every call.
pub fn client() -> Result<Client> {
    Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .context("building HTTP client")
}

/// One GET against a fixed endpoint template, returning the parsed JSON
/// envelope. `sort_field` only applies to the data route and requests
/// descending order by that field.
pub async fn fetch_route(
    client: &Client,
    endpoints: &Endpoints,
    route: Route,
    resource_id: &str,
    sort_field: Option<&str>,
) -> Result<Value> {
    let mut request_url = format!(
        "{}?{}={}&limit={}",
        endpoints.for_route(route),
        route.id_param(),
        resource_id,
        PAGE_LIMIT
    );
    if let Some(field) = sort_field {
        request_url.push_str(&format!("&sort={field}%20desc"));
    }
    let url = Url::parse(&request_url)
        .with_context(|| format!("invalid request URL {request_url}"))?;

    debug!(%url, route = route.label(), "GET");
    let body = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("GET {url} failed"))?
        .error_for_status()
        .with_context(|| format!("non-success status from {url}"))?
        .json::<Value>()
        .await
        .with_context(|| format!("reading JSON body from {url}"))?;
    Ok(body)
}
