// Failure paths across the page commands

use chrono::NaiveDate;
use crm_dashboard_lib::commands::leads::{leads_change_status, leads_refresh, leads_table_action};
use crm_dashboard_lib::commands::reports::{reports_load, ReportKind};
use crm_dashboard_lib::commands::session::{
    session_clear, session_current, session_save, SessionPayload,
};
use crm_dashboard_lib::commands::{AppState, TableAction};
use crm_dashboard_lib::db::DbPool;
use crm_dashboard_lib::models::query::ReportQuery;
use crm_dashboard_lib::services::api_client::ApiConfig;
use crm_dashboard_lib::services::report_panel::PanelStatus;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::{tempdir, TempDir};

const DESKTOP: u32 = 1024;

fn state_for(server: &MockServer) -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("crm.sqlite")).expect("db pool");
    let state = AppState::with_config(pool, ApiConfig::with_base_url(server.base_url()))
        .expect("app state");
    (state, dir)
}

async fn sign_in(state: &AppState, role: &str) {
    session_save(
        state,
        SessionPayload {
            token: "5c1e0f9a".to_string(),
            role: role.to_string(),
            username: "vikram".to_string(),
            user_id: Some(3),
        },
    )
    .await
    .expect("session");
}

#[tokio::test]
async fn commands_without_a_session_are_unauthorized() {
    let server = MockServer::start_async().await;
    let leads = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/");
            then.status(200).json_body(json!({"count": 0, "results": []}));
        })
        .await;
    let (state, _dir) = state_for(&server);

    let error = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect_err("no session");
    assert_eq!(error.code, "UNAUTHORIZED");
    assert_eq!(leads.hits_async().await, 0);
}

#[tokio::test]
async fn unknown_role_is_rejected_on_save() {
    let server = MockServer::start_async().await;
    let (state, _dir) = state_for(&server);

    let error = session_save(
        &state,
        SessionPayload {
            token: "abc".into(),
            role: "manager".into(),
            username: "x".into(),
            user_id: None,
        },
    )
    .await
    .expect_err("unknown role");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert!(session_current(&state).await.expect("current").is_none());
}

#[tokio::test]
async fn forbidden_response_stays_inside_the_panel() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/staff/leads/");
            then.status(403)
                .json_body(json!({"detail": "You do not have permission to perform this action."}));
        })
        .await;
    let (state, _dir) = state_for(&server);
    sign_in(&state, "staff").await;

    let view = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("view is still returned");
    assert_eq!(
        view.panel.status,
        PanelStatus::Failed("You do not have permission to perform this action.".to_string())
    );
    assert!(view.panel.table.rows.is_empty());
    assert_eq!(view.counts.total, 0);
}

#[tokio::test]
async fn html_body_is_reported_as_invalid_response() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/");
            then.status(200)
                .header("content-type", "text/html")
                .body("<html>login</html>");
        })
        .await;
    let (state, _dir) = state_for(&server);
    sign_in(&state, "admin").await;

    let view = leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("view");
    match view.panel.status {
        PanelStatus::Failed(message) => assert!(message.starts_with("Response is not valid JSON")),
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test]
async fn inverted_report_range_is_a_validation_error() {
    let server = MockServer::start_async().await;
    let report = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/reports/staff-productivity/");
            then.status(200).json_body(json!({"staff_data": []}));
        })
        .await;
    let (state, _dir) = state_for(&server);
    sign_in(&state, "admin").await;

    let query = ReportQuery::between(
        NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
    );
    let error = reports_load(&state, ReportKind::Staff, query, DESKTOP)
        .await
        .expect_err("inverted range");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(report.hits_async().await, 0);
}

#[tokio::test]
async fn table_actions_on_unknown_targets_fail_cleanly() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/");
            then.status(200).json_body(json!({
                "count": 1,
                "results": [{"id": 1, "name": "Ravi", "call": "9876543210", "status": "Leads"}]
            }));
        })
        .await;
    let (state, _dir) = state_for(&server);
    sign_in(&state, "admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");

    let error = leads_table_action(
        &state,
        TableAction::SetFilter {
            column: "budget".into(),
            needle: "10".into(),
        },
        DESKTOP,
    )
    .await
    .expect_err("unknown column");
    assert_eq!(error.code, "VALIDATION_ERROR");

    let error = leads_table_action(&state, TableAction::ToggleRow { row_id: 99 }, DESKTOP)
        .await
        .expect_err("unknown row");
    assert_eq!(error.code, "NOT_FOUND");

    let error = leads_change_status(&state, 99, "Lost".into())
        .await
        .expect_err("unknown lead");
    assert_eq!(error.code, "NOT_FOUND");

    let error = leads_change_status(&state, 1, "  ".into())
        .await
        .expect_err("blank status");
    assert_eq!(error.code, "VALIDATION_ERROR");
}

#[tokio::test]
async fn signing_out_clears_loaded_pages() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/leads/");
            then.status(200).json_body(json!({
                "count": 1,
                "results": [{"id": 1, "name": "Ravi", "call": "9876543210", "status": "Leads"}]
            }));
        })
        .await;
    let (state, _dir) = state_for(&server);
    sign_in(&state, "admin").await;
    leads_refresh(&state, ReportQuery::default(), DESKTOP)
        .await
        .expect("refresh");

    session_clear(&state).await.expect("sign out");

    assert!(session_current(&state).await.expect("current").is_none());
    assert!(!state.api().has_token());
    let panel = state.panels().leads.panel().lock().await;
    assert!(panel.table().rows().is_empty());
    assert_eq!(panel.status(), &PanelStatus::Idle);
}
