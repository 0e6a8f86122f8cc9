use axum_test::{TestServer, TestServerConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;

use crate::client_mock::InMemoryPlatform;
use crate::config::ServiceConfig;
use crate::handlers::api::AppState;
use crate::models::common::EntryId;
use crate::routes::create_router;
use crate::services::database::{create_metadata_database, MetadataDatabase};
use crate::services::store::MetadataStore;
use crate::services::tokens::EDIT_TOKEN_META_KEY;
use crate::tests::common::fixtures;

/// API integration tests against the CSV metadata database
#[cfg(test)]
mod api_tests {
    use super::*;

    fn config_for(csv_path: &str) -> ServiceConfig {
        let vars: HashMap<String, String> = [
            ("SITE_URL", fixtures::SITE_URL),
            ("EDIT_TOKEN_SECRET", fixtures::SECRET),
            ("METADATA_DATABASE_PATH", csv_path),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        ServiceConfig::from_vars(&vars).unwrap()
    }

    // Helper function to set up a server whose tokens persist to a CSV file
    fn setup_test_environment(
        platform: Arc<InMemoryPlatform>,
        csv_path: &str,
    ) -> (TestServer, Arc<MetadataDatabase>) {
        let config = config_for(csv_path);
        let database = create_metadata_database(&config.metadata_database_path).unwrap();

        let app_state = Arc::new(AppState::new(
            &config,
            platform.clone(),
            platform.clone(),
            platform,
            database.clone(),
        ));

        let app = create_router(app_state);
        let server_config = TestServerConfig::builder().mock_transport().build();
        let server = TestServer::new_with_config(app, server_config).unwrap();

        (server, database)
    }

    #[tokio::test]
    async fn test_token_persists_to_csv() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("entry_meta.csv");
        let csv_path_str = csv_path.to_str().unwrap();

        let (server, database) =
            setup_test_environment(fixtures::white_paper_platform(), csv_path_str);

        let response = server
            .post("/hooks/entry-finalized")
            .json(&json!({ "entry_id": 42 }))
            .await;
        assert_eq!(response.status_code().as_u16(), 200);

        let token = database
            .get_entry_meta(EntryId(42), EDIT_TOKEN_META_KEY)
            .unwrap()
            .unwrap();

        let contents = std::fs::read_to_string(&csv_path).unwrap();
        assert!(contents.contains(&token));
        assert!(contents.contains(EDIT_TOKEN_META_KEY));
    }

    #[tokio::test]
    async fn test_token_survives_restart() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("entry_meta.csv");
        let csv_path_str = csv_path.to_str().unwrap();
        let platform = fixtures::white_paper_platform();

        let token = {
            let (server, database) = setup_test_environment(platform.clone(), csv_path_str);
            server
                .post("/hooks/entry-finalized")
                .json(&json!({ "entry_id": 42 }))
                .await;
            database
                .get_entry_meta(EntryId(42), EDIT_TOKEN_META_KEY)
                .unwrap()
                .unwrap()
        };

        // A fresh process reads the stored token back from disk
        let (server, _) = setup_test_environment(platform, csv_path_str);

        let page: Value = server
            .get("/edit")
            .add_query_param("gform_update", "42")
            .add_query_param("token", &token)
            .await
            .json();
        assert_eq!(page["mode"], "editor");

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 42 }))
            .await
            .json();
        assert_eq!(payload["edit_token"], token.as_str());
    }

    #[tokio::test]
    async fn test_refinalize_replaces_token() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("entry_meta.csv");
        let platform = fixtures::white_paper_platform();
        let (server, database) =
            setup_test_environment(platform.clone(), csv_path.to_str().unwrap());

        server
            .post("/hooks/entry-finalized")
            .json(&json!({ "entry_id": 42 }))
            .await;
        let first = database
            .get_entry_meta(EntryId(42), EDIT_TOKEN_META_KEY)
            .unwrap()
            .unwrap();

        // Same entry and creation time derive the same token
        server
            .post("/hooks/entry-finalized")
            .json(&json!({ "entry_id": 42 }))
            .await;
        let second = database
            .get_entry_meta(EntryId(42), EDIT_TOKEN_META_KEY)
            .unwrap()
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(database.entry_meta(EntryId(42)).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_tokens_are_per_entry() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("entry_meta.csv");
        let platform = fixtures::white_paper_platform();
        let mut second_entry = fixtures::white_paper_entry();
        second_entry.id = EntryId(43);
        platform.insert_entry(second_entry);

        let (server, database) =
            setup_test_environment(platform.clone(), csv_path.to_str().unwrap());

        for id in [42, 43] {
            server
                .post("/hooks/entry-finalized")
                .json(&json!({ "entry_id": id }))
                .await;
        }

        let token_42 = database
            .get_entry_meta(EntryId(42), EDIT_TOKEN_META_KEY)
            .unwrap()
            .unwrap();
        let token_43 = database
            .get_entry_meta(EntryId(43), EDIT_TOKEN_META_KEY)
            .unwrap()
            .unwrap();
        assert_ne!(token_42, token_43);

        // A token only opens the entry it was issued for
        let page: Value = server
            .get("/edit")
            .add_query_param("gform_update", "43")
            .add_query_param("token", &token_42)
            .await
            .json();
        assert_eq!(page["mode"], "content");
    }
}
