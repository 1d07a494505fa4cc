// src/dataset/mod.rs

use reqwest::Client;
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::fetch::{self, envelope, Endpoints, Route};
use crate::meta::{FieldDescriptor, ResourceMetadata};
use crate::table::{self, NormalizedTable};

/// Overall outcome of loading one resource.
#[derive(Debug)]
pub enum TableState {
    Available(NormalizedTable),
    Unavailable(String),
}

/// One remote resource: raw envelopes, parsed metadata and records, and the
/// normalized table when everything succeeded. Fetched once at construction
/// and immutable afterwards.
#[derive(Debug)]
pub struct Dataset {
    pub resource_id: String,
    pub raw_meta: Option<Value>,
    pub raw_data: Option<Value>,
    pub metadata: Option<ResourceMetadata>,
    pub records: Option<Vec<Map<String, Value>>>,
    state: TableState,
}

impl Dataset {
    /// Fetch metadata then data for `resource_id` and normalize into a
    /// table. Every failure degrades to [`TableState::Unavailable`] with a
    /// log line; nothing escapes.
    pub async fn load(client: &Client, resource_id: &str) -> Dataset {
        Dataset::load_from(client, &Endpoints::default(), resource_id).await
    }

    /// [`Dataset::load`] against explicit endpoints.
    pub async fn load_from(client: &Client, endpoints: &Endpoints, resource_id: &str) -> Dataset {
        info!(resource = resource_id, "fetching metadata via API");
        let raw_meta =
            match fetch::fetch_route(client, endpoints, Route::Meta, resource_id, None).await {
                Ok(body) => Some(body),
                Err(e) => {
                    error!(resource = resource_id, error = %e, "metadata fetch failed");
                    None
                }
            };

        // Sort descending by the first datetime field so the fixed page
        // limit keeps the newest records.
        let sort_field = raw_meta
            .as_ref()
            .and_then(|raw| envelope::meta_result(raw).ok())
            .and_then(|meta| meta.datetime_fields().first().map(|f| f.name.clone()));

        let raw_data = if raw_meta.is_some() {
            info!(resource = resource_id, "fetching data via API");
            match fetch::fetch_route(
                client,
                endpoints,
                Route::Data,
                resource_id,
                sort_field.as_deref(),
            )
            .await
            {
                Ok(body) => Some(body),
                Err(e) => {
                    error!(resource = resource_id, error = %e, "data fetch failed");
                    None
                }
            }
        } else {
            None
        };

        Dataset::from_raw(resource_id, raw_meta, raw_data)
    }

    /// Assemble a dataset from already-fetched envelopes. Parse and
    /// normalization failures degrade to `Unavailable`.
    pub fn from_raw(
        resource_id: &str,
        raw_meta: Option<Value>,
        raw_data: Option<Value>,
    ) -> Dataset {
        let metadata = raw_meta.as_ref().and_then(|raw| {
            match envelope::meta_result(raw) {
                Ok(meta) => Some(meta),
                Err(e) => {
                    warn!(resource = resource_id, error = %e, "metadata unavailable");
                    None
                }
            }
        });
        let records = raw_data.as_ref().and_then(|raw| {
            match envelope::data_records(raw) {
                Ok(records) => Some(records),
                Err(e) => {
                    warn!(resource = resource_id, error = %e, "data unavailable");
                    None
                }
            }
        });

        let state = match (&metadata, &records) {
            (Some(meta), Some(records)) => match table::normalize(records, meta) {
                Ok(table) => {
                    info!(dataset = %meta.name, rows = table.num_rows(), "loaded");
                    TableState::Available(table)
                }
                Err(e) => {
                    error!(dataset = %meta.name, error = %e, "normalization failed");
                    TableState::Unavailable(format!("normalization failed: {e}"))
                }
            },
            (Some(meta), None) => {
                info!(dataset = %meta.name, "unable to load data");
                TableState::Unavailable("no records available".to_string())
            }
            (None, _) => {
                info!(resource = resource_id, "unable to load data");
                TableState::Unavailable(format!("metadata unavailable for {resource_id}"))
            }
        };

        Dataset {
            resource_id: resource_id.to_string(),
            raw_meta,
            raw_data,
            metadata,
            records,
            state,
        }
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn table(&self) -> Option<&NormalizedTable> {
        match &self.state {
            TableState::Available(table) => Some(table),
            TableState::Unavailable(_) => None,
        }
    }

    /// Metadata display name, falling back to the resource id while the
    /// metadata is unavailable.
    pub fn display_name(&self) -> &str {
        self.metadata
            .as_ref()
            .map(|m| m.name.as_str())
            .unwrap_or(&self.resource_id)
    }

    pub fn datetime_fields(&self) -> Vec<&FieldDescriptor> {
        self.metadata
            .as_ref()
            .map(|m| m.datetime_fields())
            .unwrap_or_default()
    }

    pub fn null_sentinels(&self, column: &str) -> Vec<String> {
        self.metadata
            .as_ref()
            .map(|m| m.null_sentinels(column))
            .unwrap_or_default()
    }
}
