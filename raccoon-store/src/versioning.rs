//! Versioning configuration seed

use crate::document::Document;
use crate::error::StoreResult;
use crate::store::DocumentStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub const VERSIONING_CONFIGURATION_ID: &str = "Raven/Versioning/DefaultConfiguration";

/// Default revisions policy for every collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VersioningConfiguration {
    pub exclude: bool,
    pub id: String,
}

impl Default for VersioningConfiguration {
    fn default() -> Self {
        Self {
            exclude: true,
            id: VERSIONING_CONFIGURATION_ID.to_string(),
        }
    }
}

impl Document for VersioningConfiguration {
    const COLLECTION: Option<&'static str> = None;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Overwrite the default configuration so documents are excluded from versioning
pub async fn seed_default_configuration(store: &Arc<DocumentStore>) -> StoreResult<()> {
    let mut session = store.open_session();
    session.store(&VersioningConfiguration::default())?;
    session.save_changes().await?;
    debug!("Seeded {}", VERSIONING_CONFIGURATION_ID);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use crate::connection::ConnectionString;
    use serde_json::json;

    #[test]
    fn test_document_shape() {
        let value = serde_json::to_value(VersioningConfiguration::default()).unwrap();
        assert_eq!(
            value,
            json!({ "Exclude": true, "Id": "Raven/Versioning/DefaultConfiguration" })
        );
    }

    #[tokio::test]
    async fn test_seed_overwrites_existing_document() {
        let store = Arc::new(DocumentStore::with_backend(
            ConnectionString::InMemory,
            Arc::new(MemoryBackend::new()),
        ));

        let mut session = store.open_session();
        session
            .store(&VersioningConfiguration {
                exclude: false,
                id: VERSIONING_CONFIGURATION_ID.to_string(),
            })
            .unwrap();
        session.save_changes().await.unwrap();

        seed_default_configuration(&store).await.unwrap();
        seed_default_configuration(&store).await.unwrap();

        let seeded: VersioningConfiguration = store
            .open_session()
            .load(VERSIONING_CONFIGURATION_ID)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(seeded, VersioningConfiguration::default());
    }
}
