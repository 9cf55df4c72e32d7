use crm_dashboard_lib::commands::projects::{
    projects_create, projects_delete, projects_load, projects_table_action, projects_update,
    ProjectPayload,
};
use crm_dashboard_lib::commands::session::{session_save, SessionPayload};
use crm_dashboard_lib::commands::{AppState, TableAction};
use crm_dashboard_lib::db::DbPool;
use crm_dashboard_lib::models::query::ReportQuery;
use crm_dashboard_lib::services::api_client::ApiConfig;
use crm_dashboard_lib::services::report_panel::PanelStatus;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;
use tempfile::{tempdir, TempDir};

const TABLET: u32 = 800;
const PHONE: u32 = 360;

async fn setup(server: &MockServer, role: &str) -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("crm.sqlite")).expect("db pool");
    let state = AppState::with_config(pool, ApiConfig::with_base_url(server.base_url()))
        .expect("app state");
    session_save(
        &state,
        SessionPayload {
            token: "0a7c55d1".to_string(),
            role: role.to_string(),
            username: "nisha".to_string(),
            user_id: None,
        },
    )
    .await
    .expect("session");
    (state, dir)
}

async fn mock_project_page(server: &MockServer) {
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/projects/").query_param("page", "1");
            then.status(200).json_body(json!({
                "count": 3,
                "next": null,
                "previous": null,
                "results": [
                    {"id": 1, "name": "Skyline Towers", "youtube_link": "https://youtu.be/a1",
                     "media_file": "http://cdn.local/skyline.jpg", "created_date": "2024-03-01"},
                    {"id": 2, "name": "Green Meadows", "created_date": "2024-03-05"},
                    {"id": 3, "name": "Lake View", "message": "Phase 2 open",
                     "created_date": "2024-03-09"}
                ]
            }));
        })
        .await;
}

#[tokio::test]
async fn project_list_pages_on_the_client() {
    let server = MockServer::start_async().await;
    mock_project_page(&server).await;
    let (state, _dir) = setup(&server, "staff").await;

    let view = projects_load(&state, ReportQuery::default().with_page(1), TABLET)
        .await
        .expect("projects");
    assert_eq!(view.status, PanelStatus::Ready);
    assert_eq!(view.server_page.as_ref().map(|page| page.count), Some(3));

    let view = projects_table_action(&state, TableAction::SetPageSize { page_size: 2 }, TABLET)
        .await
        .expect("page size");
    assert_eq!(view.table.rows.len(), 2);
    assert!(view.table.pager.can_next);
    assert!(!view.table.pager.can_previous);

    let view = projects_table_action(&state, TableAction::NextPage, TABLET)
        .await
        .expect("next page");
    assert_eq!(view.table.rows.len(), 1);
    assert_eq!(view.table.rows[0].id, 3);
    assert!(!view.table.pager.can_next);
    assert!(view.table.pager.can_previous);

    let compact = projects_table_action(&state, TableAction::ToggleRow { row_id: 3 }, PHONE)
        .await
        .expect("expand");
    let detail = compact.table.rows[0].detail.as_ref().expect("detail");
    assert!(detail
        .iter()
        .any(|entry| entry.label == "Description" && entry.value == "Phase 2 open"));
}

#[tokio::test]
async fn create_sends_multipart_fields_and_media() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/projects/")
                .body_contains("name=\"name\"")
                .body_contains("Harbour Point")
                .body_contains("name=\"youtube_link\"")
                .body_contains("filename=\"brochure.pdf\"");
            then.status(201).json_body(json!({
                "id": 11,
                "name": "Harbour Point",
                "youtube_link": "https://youtu.be/hp",
                "media_file": "http://cdn.local/brochure.pdf"
            }));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let project = projects_create(
        &state,
        ProjectPayload {
            name: "Harbour Point".into(),
            youtube_link: Some("https://youtu.be/hp".into()),
            media_file_name: Some("brochure.pdf".into()),
            media_content_type: Some("application/pdf".into()),
            media_bytes: Some(b"%PDF-1.4 test".to_vec()),
            ..ProjectPayload::default()
        },
    )
    .await
    .expect("created");

    create.assert_async().await;
    assert_eq!(project.id, 11);
    assert_eq!(
        state.panels().projects.lock().await.table().rows()[0].name,
        "Harbour Point"
    );
}

#[tokio::test]
async fn invalid_project_is_rejected_locally() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/projects/");
            then.status(201).json_body(json!({"id": 1, "name": "x"}));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let error = projects_create(
        &state,
        ProjectPayload {
            name: "Harbour Point".into(),
            youtube_link: Some("youtube dot com".into()),
            ..ProjectPayload::default()
        },
    )
    .await
    .expect_err("bad link");
    assert_eq!(error.code, "VALIDATION_ERROR");

    let error = projects_create(&state, ProjectPayload::default())
        .await
        .expect_err("missing name");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(create.hits_async().await, 0);
}

#[tokio::test]
async fn update_and_delete_keep_the_table_in_step() {
    let server = MockServer::start_async().await;
    mock_project_page(&server).await;
    server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/api/projects/2/")
                .body_contains("Green Meadows Phase 2");
            then.status(200).json_body(json!({
                "id": 2, "name": "Green Meadows Phase 2", "created_date": "2024-03-05"
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/projects/1/");
            then.status(204);
        })
        .await;
    let (state, _dir) = setup(&server, "super admin").await;
    projects_load(&state, ReportQuery::default().with_page(1), TABLET)
        .await
        .expect("projects");

    projects_update(
        &state,
        2,
        ProjectPayload {
            name: "Green Meadows Phase 2".into(),
            ..ProjectPayload::default()
        },
    )
    .await
    .expect("updated");

    projects_delete(&state, 1).await.expect("deleted");
    delete.assert_async().await;

    let panel = state.panels().projects.lock().await;
    let names: Vec<&str> = panel
        .table()
        .rows()
        .iter()
        .map(|project| project.name.as_str())
        .collect();
    assert_eq!(names, vec!["Green Meadows Phase 2", "Lake View"]);
}

#[tokio::test]
async fn staff_cannot_delete_projects() {
    let server = MockServer::start_async().await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/projects/1/");
            then.status(204);
        })
        .await;
    let (state, _dir) = setup(&server, "staff").await;

    let error = projects_delete(&state, 1).await.expect_err("forbidden");
    assert_eq!(error.code, "FORBIDDEN");
    assert_eq!(delete.hits_async().await, 0);
}
