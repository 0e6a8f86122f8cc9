use axum_test::{TestServer, TestServerConfig};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::client_mock::InMemoryPlatform;
use crate::config::ServiceConfig;
use crate::handlers::api::AppState;
use crate::models::form::{FieldDescriptor, FormSchema, InputDescriptor, SubmissionEntry};
use crate::routes::create_router;
use crate::tests::common::fixtures;

/// End-to-end submission workflow tests
#[cfg(test)]
mod workflow_tests {
    use super::*;

    fn server_for(platform: Arc<InMemoryPlatform>, extra: &[(&str, &str)]) -> TestServer {
        let mut vars: HashMap<String, String> = HashMap::new();
        vars.insert("SITE_URL".to_string(), "https://example.org/".to_string());
        vars.insert("EDIT_TOKEN_SECRET".to_string(), fixtures::SECRET.to_string());
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        let config = ServiceConfig::from_vars(&vars).unwrap();

        let app_state = Arc::new(AppState::new(
            &config,
            platform.clone(),
            platform.clone(),
            platform.clone(),
            platform,
        ));

        let config = TestServerConfig::builder().mock_transport().build();
        TestServer::new_with_config(create_router(app_state), config).unwrap()
    }

    // Reviewer form nested inside a chapter form nested inside the paper form
    fn three_level_platform() -> Arc<InMemoryPlatform> {
        let platform = Arc::new(InMemoryPlatform::new());

        platform.insert_form(FormSchema::new(
            30,
            "Reviewer",
            vec![FieldDescriptor::name(
                1,
                "Reviewer Name",
                vec![
                    InputDescriptor::new("1.3", "First"),
                    InputDescriptor::new("1.6", "Last"),
                ],
            )],
        ));
        platform.insert_form(FormSchema::new(
            20,
            "Chapter",
            vec![
                FieldDescriptor::generic(1, "Title"),
                FieldDescriptor::nested_form(2, "Reviewers"),
            ],
        ));
        platform.insert_form(FormSchema::new(
            1,
            "Paper",
            vec![
                FieldDescriptor::generic(1, "Paper Title"),
                FieldDescriptor::nested_form(2, "Chapters"),
            ],
        ));

        platform.insert_entry(
            SubmissionEntry::new(301, 30, fixtures::DATE_CREATED)
                .with_value("1.3", "  Alan ")
                .with_value("1.6", "Turing"),
        );
        platform.insert_entry(
            SubmissionEntry::new(201, 20, fixtures::DATE_CREATED)
                .with_value("1", "Engines")
                .with_value("2", "301"),
        );
        platform.insert_entry(
            SubmissionEntry::new(202, 20, fixtures::DATE_CREATED).with_value("1", "Looms"),
        );
        platform.insert_entry(
            SubmissionEntry::new(7, 1, fixtures::DATE_CREATED)
                .with_value("1", "Analytical Engines")
                .with_value("2", "201, 999,abc,202"),
        );

        platform
    }

    #[tokio::test]
    async fn test_full_edit_link_workflow() {
        let platform = fixtures::white_paper_platform();
        let server = server_for(platform, &[]);

        // 1. Entry is finalized and gets its token
        let finalized = server
            .post("/hooks/entry-finalized")
            .json(&json!({ "entry_id": 42 }))
            .await;
        assert_eq!(finalized.status_code().as_u16(), 200);

        // 2. Webhook payload carries the edit link
        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 42 }))
            .await
            .json();
        let token = payload["edit_token"].as_str().unwrap().to_string();
        let edit_url = payload["edit_url"].as_str().unwrap().to_string();
        assert_eq!(
            edit_url,
            format!(
                "https://example.org/form-test-edit/?gform_update=42&token={}",
                token
            )
        );

        // 3. Following the link opens the editor
        let page: Value = server
            .get("/edit")
            .add_query_param("gform_update", "42")
            .add_query_param("token", &token)
            .await
            .json();
        assert_eq!(page["mode"], "editor");
        assert_eq!(page["field_values"]["1"], "Acme");

        // 4. The notification carries the same link
        let notification: Value = server
            .post("/hooks/notification")
            .json(&json!({
                "entry_id": 42,
                "notification": { "message": "New white paper" }
            }))
            .await
            .json();
        assert!(notification["message"]
            .as_str()
            .unwrap()
            .contains(&edit_url));
    }

    #[tokio::test]
    async fn test_nested_forms_resolve_recursively() {
        let server = server_for(three_level_platform(), &[]);

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 7 }))
            .await
            .json();

        // Unknown and malformed child ids are dropped, order is kept
        assert_eq!(
            payload,
            json!({
                "submission_data": {
                    "paper__title": "Analytical Engines",
                    "chapters": [
                        {
                            "title": "Engines",
                            "reviewers": [{ "reviewer__name": "Alan Turing" }]
                        },
                        {
                            "title": "Looms",
                            "reviewers": []
                        }
                    ]
                }
            })
        );
    }

    #[tokio::test]
    async fn test_depth_limit_stops_nesting() {
        let server = server_for(three_level_platform(), &[("NESTED_FORM_MAX_DEPTH", "1")]);

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 7 }))
            .await
            .json();

        assert_eq!(payload["submission_data"]["chapters"][0]["title"], "Engines");
        assert_eq!(
            payload["submission_data"]["chapters"][0]["reviewers"],
            json!([])
        );
    }

    #[tokio::test]
    async fn test_legacy_fields_workflow() {
        let platform = Arc::new(InMemoryPlatform::new());
        platform.insert_form(fixtures::white_paper_form());
        platform.insert_form(fixtures::author_form());
        platform.insert_entry(fixtures::author_entry(101, "Grace"));
        platform.insert_user(fixtures::test_user());
        let mut entry = fixtures::white_paper_entry();
        entry.created_by = Some(fixtures::test_user().user_id);
        platform.insert_entry(entry);

        let server = server_for(platform, &[("LEGACY_WEBHOOK_FIELDS", "true")]);

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 42 }))
            .await
            .json();

        assert_eq!(
            payload["form_info"],
            json!({
                "form_id": 1,
                "form_title": "White Paper Submission",
                "form_description": "Submit a white paper for review"
            })
        );
        assert_eq!(
            payload["submission_time"],
            json!({
                "timestamp": fixtures::DATE_CREATED,
                "formatted": fixtures::DATE_CREATED
            })
        );
        assert_eq!(payload["user_info"]["user_email"], "ada@example.org");
        assert_eq!(payload["submission_data"]["contact"], "Ada Lovelace");
    }

    #[tokio::test]
    async fn test_anonymous_submission_has_no_user_info() {
        let server = server_for(
            fixtures::white_paper_platform(),
            &[("LEGACY_WEBHOOK_FIELDS", "true")],
        );

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 42 }))
            .await
            .json();

        assert!(payload.get("form_info").is_some());
        assert!(payload.get("user_info").is_none());
    }

    #[tokio::test]
    async fn test_slow_child_keeps_declared_order() {
        let platform = three_level_platform();
        platform.delay_entry(crate::models::common::EntryId(201), 50);
        let server = server_for(platform, &[]);

        let payload: Value = server
            .post("/hooks/webhook-payload")
            .json(&json!({ "entry_id": 7 }))
            .await
            .json();

        let titles: Vec<&str> = payload["submission_data"]["chapters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|chapter| chapter["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Engines", "Looms"]);
    }
}
