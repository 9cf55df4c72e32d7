use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use crm_dashboard_lib::commands::incentives::{
    incentive_calculate, incentive_for_staff, slabs_create, slabs_delete, slabs_load,
};
use crm_dashboard_lib::commands::reports::{reports_load, reports_table_action, ReportKind};
use crm_dashboard_lib::commands::session::{session_save, SessionPayload};
use crm_dashboard_lib::commands::{AppState, TableAction};
use crm_dashboard_lib::db::DbPool;
use crm_dashboard_lib::models::incentive::IncentiveSlabInput;
use crm_dashboard_lib::models::query::ReportQuery;
use crm_dashboard_lib::services::api_client::ApiConfig;
use crm_dashboard_lib::services::report_panel::{LoadOutcome, PanelStatus};
use crm_dashboard_lib::services::report_service::ProductivityScope;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::{tempdir, TempDir};

const DESKTOP: u32 = 1440;

async fn setup(server: &MockServer, role: &str) -> (AppState, TempDir) {
    let dir = tempdir().expect("temp dir");
    let pool = DbPool::new(dir.path().join("crm.sqlite")).expect("db pool");
    let state = AppState::with_config(pool, ApiConfig::with_base_url(server.base_url()))
        .expect("app state");
    session_save(
        &state,
        SessionPayload {
            token: "e81b22f0".to_string(),
            role: role.to_string(),
            username: "rahul".to_string(),
            user_id: Some(1),
        },
    )
    .await
    .expect("session");
    (state, dir)
}

fn april() -> ReportQuery {
    ReportQuery::between(
        NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 4, 30).unwrap(),
    )
}

#[tokio::test]
async fn staff_report_loads_named_envelope_with_totals() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/reports/staff-productivity/")
                .query_param("start_date", "2024-04-01")
                .query_param("end_date", "2024-04-30");
            then.status(200).json_body(json!({
                "staff_data": [
                    {"staff_id": 3, "staff_name": "Kiran", "total_calls": 40, "interested": 8,
                     "interested_percentage": 20.0, "visit": 2},
                    {"staff_id": 4, "staff_name": "Divya", "total_calls": 25, "interested": 5,
                     "lost": 4}
                ]
            }));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let view = reports_load(&state, ReportKind::Staff, april(), DESKTOP)
        .await
        .expect("report");
    mock.assert_async().await;

    assert_eq!(view.panel.status, PanelStatus::Ready);
    assert_eq!(view.totals.people, 2);
    assert_eq!(view.totals.total_calls, 65);
    assert_eq!(view.totals.interested, 13);

    let kiran = &view.panel.table.rows[0];
    let pct = kiran
        .cells
        .iter()
        .find(|cell| cell.key == "interested_percentage")
        .expect("percentage column");
    assert_eq!(pct.text, "20.00%");
    let divya_pct = view.panel.table.rows[1]
        .cells
        .iter()
        .find(|cell| cell.key == "interested_percentage")
        .expect("percentage column");
    assert_eq!(divya_pct.text, "-");

    let sorted = reports_table_action(
        &state,
        ReportKind::Staff,
        TableAction::ToggleSort {
            column: "total_calls".into(),
        },
        DESKTOP,
    )
    .await
    .expect("sort");
    assert_eq!(sorted.panel.table.rows[0].id, 4);

    let sorted = reports_table_action(
        &state,
        ReportKind::Staff,
        TableAction::ToggleSort {
            column: "total_calls".into(),
        },
        DESKTOP,
    )
    .await
    .expect("sort");
    assert_eq!(sorted.panel.table.rows[0].id, 3);
}

#[tokio::test]
async fn one_failing_report_does_not_touch_the_other() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/reports/staff-productivity/");
            then.status(500).json_body(json!({"detail": "database unavailable"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/reports/team-leader-productivity/");
            then.status(200).json_body(json!({
                "team_leader_data": [
                    {"team_leader_id": 9, "team_leader_name": "Meera", "total_calls": 120}
                ]
            }));
        })
        .await;
    let (state, _dir) = setup(&server, "super_admin").await;

    let (staff, leaders) = futures::join!(
        reports_load(&state, ReportKind::Staff, ReportQuery::default(), DESKTOP),
        reports_load(&state, ReportKind::TeamLeader, ReportQuery::default(), DESKTOP),
    );

    let staff = staff.expect("staff view");
    assert_eq!(
        staff.panel.status,
        PanelStatus::Failed("Server error (status 500)".to_string())
    );
    assert!(staff.panel.table.rows.is_empty());

    let leaders = leaders.expect("team leader view");
    assert_eq!(leaders.panel.status, PanelStatus::Ready);
    assert_eq!(leaders.panel.table.rows[0].cells[0].text, "Meera");
}

#[tokio::test]
async fn slower_earlier_load_is_discarded() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/reports/staff-productivity/")
                .query_param("staff_id", "1");
            then.status(200)
                .delay(StdDuration::from_millis(400))
                .json_body(json!({"staff_data": [{"staff_id": 1, "staff_name": "Old"}]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/reports/staff-productivity/")
                .query_param("staff_id", "2");
            then.status(200)
                .json_body(json!({"staff_data": [{"staff_id": 2, "staff_name": "New"}]}));
        })
        .await;
    let (state, _dir) = setup(&server, "admin").await;

    let panel = &state.panels().staff_report;
    let first_service = state.reports();
    let second_service = state.reports();
    let first_query = ReportQuery::default().with_staff(1);
    let second_query = ReportQuery::default().with_staff(2);

    let (first, second) = futures::join!(
        panel.load(async move {
            first_service
                .productivity(ProductivityScope::Staff, &first_query)
                .await
        }),
        panel.load(async move {
            second_service
                .productivity(ProductivityScope::Staff, &second_query)
                .await
        }),
    );

    assert_eq!(first, LoadOutcome::Discarded);
    assert_eq!(second, LoadOutcome::Applied);
    let panel = panel.lock().await;
    assert_eq!(panel.table().rows()[0].name, "New");
}

#[tokio::test]
async fn incentive_uses_matching_active_slab() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/incentive-slabs/");
            then.status(200).json_body(json!([
                {"id": 1, "slab_name": "Bronze", "min_amount": "0", "max_amount": "25000",
                 "incentive_percentage": "2", "is_active": true},
                {"id": 2, "slab_name": "Silver", "min_amount": "25000", "max_amount": "75000",
                 "incentive_percentage": "4.5", "is_active": true},
                {"id": 3, "slab_name": "Legacy", "min_amount": "25000", "max_amount": "75000",
                 "incentive_percentage": "9", "is_active": false}
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/staff/5/earnings/");
            then.status(200).json_body(json!({"total_earn": "40000.00"}));
        })
        .await;
    let (state, _dir) = setup(&server, "staff").await;

    let summary = incentive_for_staff(&state, 5).await.expect("summary");
    assert_eq!(summary.slab.as_ref().map(|slab| slab.id), Some(2));
    assert_eq!(summary.incentive_amount, 1800.0);

    let view = slabs_load(&state, DESKTOP).await.expect("slabs");
    assert_eq!(view.table.rows.len(), 3);

    let boundary = incentive_calculate(&state, 25_000.0).await.expect("calculator");
    assert_eq!(boundary.slab.map(|slab| slab.slab_name), Some("Silver".to_string()));

    let none = incentive_calculate(&state, 90_000.0).await.expect("calculator");
    assert!(none.slab.is_none());
    assert_eq!(none.incentive_amount, 0.0);
}

#[tokio::test]
async fn slab_changes_require_admin_and_valid_ranges() {
    let server = MockServer::start_async().await;
    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/incentive-slabs/");
            then.status(201).json_body(json!({
                "id": 8, "slab_name": "Gold", "min_amount": "75000.00",
                "max_amount": "150000.00", "incentive_percentage": "6.00", "is_active": true
            }));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/incentive-slabs/8/");
            then.status(204);
        })
        .await;

    let gold = IncentiveSlabInput {
        slab_name: "Gold".into(),
        min_amount: 75_000.0,
        max_amount: 150_000.0,
        incentive_percentage: 6.0,
        is_active: true,
    };

    let (staff_state, _staff_dir) = setup(&server, "staff").await;
    let error = slabs_create(&staff_state, gold.clone())
        .await
        .expect_err("staff cannot create slabs");
    assert_eq!(error.code, "FORBIDDEN");

    let (state, _dir) = setup(&server, "admin").await;
    let error = slabs_create(
        &state,
        IncentiveSlabInput {
            min_amount: 200_000.0,
            ..gold.clone()
        },
    )
    .await
    .expect_err("inverted range");
    assert_eq!(error.code, "VALIDATION_ERROR");
    assert_eq!(create.hits_async().await, 0);

    let slab = slabs_create(&state, gold).await.expect("created");
    assert_eq!(slab.id, 8);
    assert_eq!(
        state.panels().slabs.lock().await.table().rows().len(),
        1
    );

    slabs_delete(&state, 8).await.expect("deleted");
    delete.assert_async().await;
    assert!(state.panels().slabs.lock().await.table().rows().is_empty());
}
