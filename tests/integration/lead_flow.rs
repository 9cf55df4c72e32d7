use crm_dashboard_lib::commands::leads::{
    leads_change_status, leads_create, leads_history, leads_import, leads_import_template,
    leads_refresh, leads_reload_one, leads_table_action, leads_view, LeadImportPayload,
};
use crm_dashboard_lib::commands::notices::notices_drain;
use crm_dashboard_lib::commands::session::{session_save, SessionPayload};
use crm_dashboard_lib::commands::{AppState, TableAction};
use crm_dashboard_lib::db::DbPool;
use crm_dashboard_lib::models::lead::{LeadCreateInput, LeadStatus};
use crm_dashboard_lib::models::notice::NoticeLevel;
use crm_dashboard_lib::models::query::ReportQuery;
use crm_dashboard_lib::services::api_client::ApiConfig;
use crm_dashboard_lib::services::report_panel::PanelStatus;
use httpmock::prelude::*;
use httpmock::Method::PATCH;
use serde_json::json;
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::time::{sleep, timeout};

const DESKTOP: u32 = 1280;
const PHONE: u32 = 375;

async fn setup(server: &MockServer, role: &str) -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("crm.sqlite")).expect("db pool");
    let state = AppState::with_config(pool, ApiConfig::with_base_url(server.base_url()))
        .expect("app state");

    session_save(
        &state,
        SessionPayload {
            token: "7d2e91c4".to_string(),
            role: role.to_string(),
            username: "asha".to_string(),
            user_id: Some(7),
        },
    )
    .await
    .expect("session");

    (state, dir)
}

async fn mock_two_leads(server: &MockServer, path: &str) {
    let path = path.to_string();
    server
        .mock_async(move |when, then| {
            when.method(GET).path(path);
            then.status(200).json_body(json!({
                "count": 2,
                "next": null,
                "previous": null,
                "results": [
                    {"id": 1, "name": "Ravi Kumar", "call": "9876543210", "status": "Leads",
                     "assigned_to": 7, "created_date": "2024-04-02"},
                    {"id": 2, "name": "Anu Nair", "call": "9123456780", "status": "Visit",
                     "assigned_to": 8, "created_date": "2024-04-03"}
                ]
            }));
        })
        .await;
}

#[tokio::test]
async fn failed_patch_leaves_lead_in_its_previous_status() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    let patch = server
        .mock_async(|when, then| {
            when.method(PATCH)
                .path("/api/leads/1/")
                .json_body(json!({"status": "Lost"}));
            then.status(500).body("upstream exploded");
        })
        .await;

    let (state, _dir) = setup(&server, "admin").await;
    let view = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");
    assert_eq!(view.panel.status, PanelStatus::Ready);
    assert_eq!(view.panel.table.rows.len(), 2);

    let error = leads_change_status(&state, 1, "Lost".to_string())
        .await
        .expect_err("patch fails");
    assert_eq!(error.code, "SERVER_ERROR");
    patch.assert_async().await;

    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.rows[0].cells[2].text, "Leads");
    assert_eq!(view.panel.table.rows[1].cells[2].text, "Visit");
    assert_eq!(view.counts.leads, 1);
    assert_eq!(view.counts.lost, 0);

    let notices = notices_drain(&state).await.expect("notices");
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
}

#[tokio::test]
async fn successful_patch_merges_the_echoed_lead() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path("/api/leads/2/");
            then.status(200).json_body(json!({
                "id": 2, "name": "Anu Nair", "call": "9123456780", "status": "Interested",
                "assigned_to": 8, "updated_date": "2024-04-05T10:00:00Z"
            }));
        })
        .await;

    let (state, _dir) = setup(&server, "super admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");

    let lead = leads_change_status(&state, 2, "Interested".to_string())
        .await
        .expect("patch succeeds");
    assert_eq!(lead.status, LeadStatus::Interested);
    assert_eq!(lead.updated_date.as_deref(), Some("2024-04-05T10:00:00Z"));

    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.counts.interested, 1);
    assert_eq!(view.counts.visit, 0);

    let notices = notices_drain(&state).await.expect("notices");
    assert_eq!(notices[0].level, NoticeLevel::Success);
}

#[tokio::test]
async fn board_answers_while_a_status_write_is_slow() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path("/api/leads/1/");
            then.status(500)
                .delay(Duration::from_millis(1500))
                .body("upstream exploded");
        })
        .await;

    let (state, _dir) = setup(&server, "admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");

    let pending = {
        let state = state.clone();
        tokio::spawn(async move { leads_change_status(&state, 1, "Lost".to_string()).await })
    };
    sleep(Duration::from_millis(200)).await;

    let view = timeout(Duration::from_millis(500), leads_view(&state, DESKTOP))
        .await
        .expect("view answers during the write")
        .expect("view");
    assert_eq!(view.panel.table.rows[0].cells[2].text, "Lost");
    assert_eq!(view.counts.lost, 1);

    let view = timeout(
        Duration::from_millis(500),
        leads_table_action(&state, TableAction::ToggleRow { row_id: 2 }, DESKTOP),
    )
    .await
    .expect("table action answers during the write")
    .expect("toggle");
    assert_eq!(view.panel.table.rows.len(), 2);

    let error = pending.await.expect("join").expect_err("patch fails");
    assert_eq!(error.code, "SERVER_ERROR");

    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.rows[0].cells[2].text, "Leads");
    assert_eq!(view.counts.lost, 0);
}

#[tokio::test]
async fn edits_that_leave_the_filter_keep_the_page_in_range() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    server
        .mock_async(|when, then| {
            when.method(PATCH).path("/api/leads/2/");
            then.status(200).json_body(json!({"status": "Not Picked"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/1/");
            then.status(200).json_body(json!({
                "id": 1, "name": "Ravi Kumar", "call": "9876543210", "status": "Not Picked"
            }));
        })
        .await;

    let (state, _dir) = setup(&server, "admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");
    for action in [
        TableAction::SetPageSize { page_size: 1 },
        TableAction::SetFilter {
            column: "status".into(),
            needle: "s".into(),
        },
        TableAction::NextPage,
    ] {
        leads_table_action(&state, action, DESKTOP)
            .await
            .expect("table action");
    }
    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.rows[0].id, 2);
    assert_eq!(view.panel.table.pager.page_index, 1);

    leads_change_status(&state, 2, "Not Picked".to_string())
        .await
        .expect("patch succeeds");
    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.pager.page_index, 0);
    assert_eq!(view.panel.table.pager.page_count, 1);
    assert_eq!(view.panel.table.rows.len(), 1);
    assert_eq!(view.panel.table.rows[0].id, 1);

    leads_reload_one(&state, 1).await.expect("reload");
    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.filtered_rows, 0);
    assert_eq!(view.panel.table.pager.page_index, 0);
    assert!(view.panel.table.rows.is_empty());
}

#[tokio::test]
async fn lead_list_is_scoped_by_role() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/team-leader/leads/").await;
    let (state, _dir) = setup(&server, "team_leader").await;

    let view = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");
    assert_eq!(view.panel.status, PanelStatus::Ready);
    assert_eq!(view.counts.total, 2);

    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/staff/leads/").await;
    let (state, _dir) = setup(&server, "staff").await;
    let view = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");
    assert_eq!(view.panel.table.rows.len(), 2);
}

#[tokio::test]
async fn compact_layout_expands_one_row_at_a_time() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    let (state, _dir) = setup(&server, "admin").await;
    leads_refresh(&state, ReportQuery::default(), PHONE)
        .await
        .expect("refresh");

    let view = leads_table_action(&state, TableAction::ToggleRow { row_id: 1 }, PHONE)
        .await
        .expect("toggle");
    let rows = &view.panel.table.rows;
    assert!(rows[0].expanded);
    assert_eq!(rows[0].cells.len(), 3);
    let detail = rows[0].detail.as_ref().expect("detail panel");
    assert!(detail
        .iter()
        .any(|entry| entry.label == "Assigned To" && entry.value == "7"));

    let view = leads_table_action(&state, TableAction::ToggleRow { row_id: 2 }, PHONE)
        .await
        .expect("toggle");
    assert!(!view.panel.table.rows[0].expanded);
    assert!(view.panel.table.rows[1].expanded);

    let view = leads_table_action(&state, TableAction::ToggleRow { row_id: 2 }, PHONE)
        .await
        .expect("toggle");
    assert!(view.panel.table.rows.iter().all(|row| !row.expanded));

    let desktop = leads_view(&state, DESKTOP).await.expect("view");
    assert!(desktop.panel.table.rows.iter().all(|row| row.detail.is_none()));
    assert_eq!(desktop.panel.table.rows[0].cells.len(), 6);
}

#[tokio::test]
async fn filter_without_matches_keeps_the_dataset() {
    let server = MockServer::start_async().await;
    mock_two_leads(&server, "/api/leads/").await;
    let (state, _dir) = setup(&server, "admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");

    let view = leads_table_action(
        &state,
        TableAction::SetFilter {
            column: "name".into(),
            needle: "zzz".into(),
        },
        DESKTOP,
    )
    .await
    .expect("filter");
    assert!(view.panel.table.rows.is_empty());
    assert_eq!(view.panel.table.total_rows, 2);
    assert_eq!(view.panel.table.filtered_rows, 0);
    assert!(!view.panel.table.pager.can_next);
    assert!(!view.panel.table.pager.can_previous);

    let view = leads_table_action(
        &state,
        TableAction::SetFilter {
            column: "name".into(),
            needle: "ANU".into(),
        },
        DESKTOP,
    )
    .await
    .expect("filter");
    assert_eq!(view.panel.table.rows.len(), 1);
    assert_eq!(view.panel.table.rows[0].id, 2);

    let error = leads_table_action(
        &state,
        TableAction::ToggleSort {
            column: "message".into(),
        },
        DESKTOP,
    )
    .await
    .expect_err("message column is not sortable");
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn create_validates_before_posting() {
    let server = MockServer::start_async().await;
    let post = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/leads/")
                .json_body(json!({"name": "Meera", "call": "+919876543210"}));
            then.status(201).json_body(json!({
                "id": 30, "name": "Meera", "call": "+919876543210", "status": "Leads"
            }));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let error = leads_create(
        &state,
        LeadCreateInput {
            name: "Meera".into(),
            call: "12345".into(),
            ..LeadCreateInput::default()
        },
    )
    .await
    .expect_err("short phone");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(post.hits_async().await, 0);

    let lead = leads_create(
        &state,
        LeadCreateInput {
            name: " Meera ".into(),
            call: "+91 98765 43210".into(),
            ..LeadCreateInput::default()
        },
    )
    .await
    .expect("created");
    assert_eq!(lead.id, 30);
    post.assert_async().await;

    let view = leads_view(&state, DESKTOP).await.expect("view");
    assert_eq!(view.panel.table.rows[0].id, 30);
    assert_eq!(view.counts.leads, 1);
}

#[tokio::test]
async fn csv_import_uploads_multipart_and_surfaces_message() {
    let server = MockServer::start_async().await;
    let import = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/leads/import/")
                .body_contains("name=\"file\"")
                .body_contains("filename=\"april.csv\"");
            then.status(200).json_body(json!({"message": "2 leads imported"}));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let error = leads_import(
        &state,
        LeadImportPayload {
            file_name: "april.xlsx".into(),
            bytes: b"name,call\n".to_vec(),
        },
    )
    .await
    .expect_err("not a csv");
    assert_eq!(error.code, "VALIDATION_ERROR");

    let outcome = leads_import(
        &state,
        LeadImportPayload {
            file_name: "april.csv".into(),
            bytes: b"name,call,status,message\nRavi,9876543210,Leads,\n".to_vec(),
        },
    )
    .await
    .expect("import");
    assert_eq!(outcome.message, "2 leads imported");
    import.assert_async().await;

    let template = leads_import_template().await.expect("template");
    assert!(template.content.starts_with("name,call,status,message"));
    assert_eq!(template.content.lines().count(), 2);
}

#[tokio::test]
async fn history_loads_bare_array_into_its_own_panel() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/1/history/");
            then.status(200).json_body(json!([
                {"id": 5, "lead": 1, "status": "Visit", "message": "Site visit booked",
                 "created_date": "2024-04-04"},
                {"id": 4, "lead": 1, "status": "Leads", "created_date": "2024-04-02"}
            ]));
        })
        .await;
    let (state, _dir) = setup(&server, "staff").await;

    let view = leads_history(&state, 1, DESKTOP).await.expect("history");
    assert_eq!(view.status, PanelStatus::Ready);
    assert_eq!(view.table.rows.len(), 2);
    assert_eq!(view.table.rows[0].cells[0].text, "Visit");
}
