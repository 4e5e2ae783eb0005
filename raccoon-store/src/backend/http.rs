//! Document server backend over HTTP
//!
//! Speaks the classic RavenDB REST surface: `GET /docs/{id}`, `POST /bulk_docs`,
//! `PUT /indexes/{name}` and `GET /stats`, optionally scoped under
//! `/databases/{name}`.

use super::StoreBackend;
use crate::document::{BatchCommand, StoredDocument};
use crate::error::{StoreError, StoreResult};
use crate::indexes::IndexDefinition;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;
use url::Url;

const ENTITY_NAME_HEADER: &str = "Raven-Entity-Name";

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(url: Url, database: Option<String>, timeout: Duration) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        let mut base = url;
        if let Some(database) = database {
            let message = format!("Url '{}' cannot carry a path", base);
            base.path_segments_mut()
                .map_err(|_| StoreError::InvalidConnectionString { message })?
                .pop_if_empty()
                .extend(["databases", database.as_str()]);
        }

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Build `{base}/{segments...}`, percent-encoding every segment
    fn endpoint<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> StoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidConnectionString {
                message: format!("Url '{}' cannot carry a path", self.base),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn bulk_payload(commands: &[BatchCommand]) -> Value {
        Value::Array(
            commands
                .iter()
                .map(|command| match command {
                    BatchCommand::Put {
                        id,
                        body,
                        collection,
                    } => {
                        let metadata = match collection {
                            Some(collection) => json!({ ENTITY_NAME_HEADER: collection }),
                            None => json!({}),
                        };
                        json!({
                            "Method": "PUT",
                            "Key": id,
                            "Document": body,
                            "Metadata": metadata,
                        })
                    }
                    BatchCommand::Delete { id } => json!({
                        "Method": "DELETE",
                        "Key": id,
                    }),
                })
                .collect(),
        )
    }
}

#[async_trait]
impl StoreBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn load(&self, id: &str) -> StoreResult<Option<StoredDocument>> {
        let url = self.endpoint(std::iter::once("docs").chain(id.split('/')))?;
        let response = self.client.get(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = response.error_for_status()?;
        let collection = response
            .headers()
            .get(ENTITY_NAME_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let body: Value = response.json().await?;

        Ok(Some(StoredDocument {
            id: id.to_string(),
            collection,
            body,
        }))
    }

    async fn batch(&self, commands: &[BatchCommand]) -> StoreResult<()> {
        let url = self.endpoint(["bulk_docs"])?;
        self.client
            .post(url)
            .json(&Self::bulk_payload(commands))
            .send()
            .await?
            .error_for_status()?;

        debug!(commands = commands.len(), "Posted batch to document server");
        Ok(())
    }

    async fn put_index(&self, index: &IndexDefinition) -> StoreResult<()> {
        let url = self.endpoint(std::iter::once("indexes").chain(index.name.split('/')))?;
        self.client
            .put(url)
            .json(&json!({ "Map": index.map() }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<()> {
        let url = self.endpoint(["stats"])?;
        self.client.get(url).send().await?.error_for_status()?;
        Ok(())
    }
}
