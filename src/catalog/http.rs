//! HTTP catalog client for Copernicus-style portals
//!
//! Speaks the hub's OpenSearch endpoint (`/search?format=json`) for queries
//! and the OData endpoint (`/Products('{id}')/$value`) for archive downloads.
//! Responses are parsed from [`serde_json::Value`] rather than a full typed
//! schema: the feed shape varies (a single match is an object, several are an
//! array) and only a handful of fields matter to the pipeline.

use super::{CatalogClient, CatalogError, CatalogResult, ProductQuery};
use crate::Product;
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Rows requested per OpenSearch page.
const PAGE_SIZE: usize = 100;

/// Request timeout for query traffic. Archive downloads run without a total
/// timeout since archives are several hundred megabytes.
const QUERY_TIMEOUT: Duration = Duration::from_secs(60);

/// Catalog client backed by a Copernicus-style HTTP portal.
#[derive(Debug)]
pub struct HttpCatalogClient {
    client: Client,
    download_client: Client,
    portal_url: String,
    credentials: Option<(String, String)>,
}

impl HttpCatalogClient {
    /// Create a client for the given portal base URL.
    ///
    /// The URL is validated up front so a malformed portal address fails
    /// before any query is issued.
    pub fn new(portal_url: &str) -> CatalogResult<Self> {
        Url::parse(portal_url).map_err(|e| CatalogError::InvalidUrl(format!("{portal_url}: {e}")))?;

        let client = Client::builder()
            .timeout(QUERY_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;
        let download_client = Client::builder()
            .connect_timeout(QUERY_TIMEOUT)
            .build()
            .map_err(|e| CatalogError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            download_client,
            portal_url: portal_url.trim_end_matches('/').to_string(),
            credentials: None,
        })
    }

    fn credentials(&self) -> CatalogResult<&(String, String)> {
        self.credentials
            .as_ref()
            .ok_or_else(|| CatalogError::AuthenticationRejected("not authenticated".to_string()))
    }

    /// One OpenSearch page of results.
    async fn search_page(&self, query_text: &str, start: usize) -> CatalogResult<Value> {
        let (username, password) = self.credentials()?;
        let url = format!("{}/search", self.portal_url);

        let response = self
            .client
            .get(&url)
            .basic_auth(username, Some(password))
            .query(&[
                ("q", query_text),
                ("start", &start.to_string()),
                ("rows", &PAGE_SIZE.to_string()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;
        response
            .json::<Value>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }
}

#[async_trait]
impl CatalogClient for HttpCatalogClient {
    async fn authenticate(&mut self, username: &str, password: &str) -> CatalogResult<()> {
        // The hub has no session endpoint; probe with an empty query so bad
        // credentials surface here instead of on the first tile query.
        let url = format!("{}/search", self.portal_url);
        let response = self
            .client
            .get(&url)
            .basic_auth(username, Some(password))
            .query(&[("q", "*"), ("rows", "0"), ("format", "json")])
            .send()
            .await
            .map_err(map_transport_error)?;

        check_status(response.status())?;
        self.credentials = Some((username.to_string(), password.to_string()));
        info!(portal = %self.portal_url, "authenticated against catalog portal");
        Ok(())
    }

    async fn query(&self, query: &ProductQuery) -> CatalogResult<Vec<Product>> {
        let query_text = format!(
            "platformname:{} AND producttype:{} AND tileid:{} AND \
             beginposition:[{}T00:00:00.000Z TO {}T23:59:59.999Z]",
            query.platform, query.product_type, query.tile_id, query.start_date, query.end_date
        );

        let mut products = Vec::new();
        let mut start = 0;
        loop {
            let page = self.search_page(&query_text, start).await?;
            let entries = feed_entries(&page);
            let page_len = entries.len();
            for entry in entries {
                products.push(parse_entry(entry)?);
            }
            if page_len < PAGE_SIZE {
                break;
            }
            start += PAGE_SIZE;
        }

        debug!(
            tile = %query.tile_id,
            matches = products.len(),
            "catalog query completed"
        );
        Ok(products)
    }

    async fn download(&self, product: &Product, dest_dir: &Path) -> CatalogResult<PathBuf> {
        let (username, password) = self.credentials()?;
        let url = format!(
            "{}/odata/v1/Products('{}')/$value",
            self.portal_url, product.id
        );
        let dest = dest_dir.join(product.archive_name());

        debug!(title = %product.title, "downloading archive to {}", dest.display());

        let response = self
            .download_client
            .get(&url)
            .basic_auth(username, Some(password))
            .send()
            .await
            .map_err(map_transport_error)?;
        check_status(response.status())?;

        let mut file = tokio::fs::File::create(&dest)
            .await
            .map_err(|e| CatalogError::Io(format!("failed to create {}: {e}", dest.display())))?;

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_transport_error)?;
            file.write_all(&chunk)
                .await
                .map_err(|e| CatalogError::Io(format!("failed to write {}: {e}", dest.display())))?;
        }
        file.flush()
            .await
            .map_err(|e| CatalogError::Io(format!("failed to flush {}: {e}", dest.display())))?;

        Ok(dest)
    }
}

fn map_transport_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout(e.to_string())
    } else if e.is_connect() {
        CatalogError::Connection(e.to_string())
    } else {
        CatalogError::Http(e.to_string())
    }
}

fn check_status(status: StatusCode) -> CatalogResult<()> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(CatalogError::AuthenticationRejected(format!(
            "portal returned {status}"
        )));
    }
    if !status.is_success() {
        return Err(CatalogError::Http(format!("portal returned {status}")));
    }
    Ok(())
}

/// Extract the entry list from an OpenSearch JSON feed.
///
/// The hub serializes a single match as an object and several matches as an
/// array; an empty result set has no `entry` key at all.
fn feed_entries(page: &Value) -> Vec<&Value> {
    match page.get("feed").and_then(|feed| feed.get("entry")) {
        Some(Value::Array(entries)) => entries.iter().collect(),
        Some(entry @ Value::Object(_)) => vec![entry],
        _ => Vec::new(),
    }
}

/// Convert one feed entry into a [`Product`].
///
/// The typed attribute arrays (`str`, `date`, `int`, `double`) are flattened
/// into the product's string attribute map for the metadata sidecar.
fn parse_entry(entry: &Value) -> CatalogResult<Product> {
    let id = entry
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::Parse("feed entry is missing 'id'".to_string()))?
        .to_string();
    let title = entry
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| CatalogError::Parse("feed entry is missing 'title'".to_string()))?
        .to_string();

    let mut attributes = BTreeMap::new();
    attributes.insert("title".to_string(), title.clone());
    for group in ["str", "date", "int", "double"] {
        for field in typed_fields(entry.get(group)) {
            let (Some(name), Some(content)) = (
                field.get("name").and_then(Value::as_str),
                field.get("content"),
            ) else {
                continue;
            };
            let rendered = match content {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            attributes.insert(name.to_string(), rendered);
        }
    }

    Ok(Product::from_catalog(id, title, attributes))
}

/// A typed attribute group is, like `entry` itself, an object when there is
/// one field and an array when there are several.
fn typed_fields(group: Option<&Value>) -> Vec<&Value> {
    match group {
        Some(Value::Array(fields)) => fields.iter().collect(),
        Some(field @ Value::Object(_)) => vec![field],
        _ => Vec::new(),
    }
}
