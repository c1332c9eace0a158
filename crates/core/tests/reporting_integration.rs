//! End-to-end reporting tests over in-memory repositories
//!
//! Exercise the full recording → windowed aggregation path, including the
//! Friday-window tail overlap and the role-based authorization checks.

#[allow(dead_code)]
mod support;

use std::sync::Arc;

use cadence_core::{ReportingService, TargetsService, TeamsService};
use cadence_domain::{
    CadenceError, NewInfoDetail, NewPlanDetail, NewTeam, NewUvDetail, InfoResponse, Ir, Role,
    TargetScope, TargetUpsert, WeekKey, WeekScheme,
};
use support::repositories::{
    InMemoryActivityRepository, InMemoryIrRepository, InMemoryTargetRepository,
    InMemoryTeamRepository,
};
use support::{at, ir_fixture};

struct Fixture {
    reporting: ReportingService,
    targets: TargetsService,
    teams_service: TeamsService,
    root: Ir,
    ldc: Ir,
    ls: Ir,
    rep: Ir,
    outsider: Ir,
    team_id: i64,
}

async fn fixture() -> Fixture {
    let root = ir_fixture("ROOT", Role::Ctc, None);
    let ldc = ir_fixture("LDC1", Role::Ldc, Some(&root));
    let ls = ir_fixture("LS1", Role::Ls, Some(&ldc));
    let rep = ir_fixture("REP1", Role::Ir, Some(&ldc));
    let outsider = ir_fixture("OUT1", Role::Ir, None);

    let irs = Arc::new(InMemoryIrRepository::seeded(vec![
        root.clone(),
        ldc.clone(),
        ls.clone(),
        rep.clone(),
        outsider.clone(),
    ]));
    let teams = Arc::new(InMemoryTeamRepository::default());
    let activities = Arc::new(InMemoryActivityRepository::default());
    let target_rows = Arc::new(InMemoryTargetRepository::default());

    let scheme = WeekScheme::default();
    let teams_service = TeamsService::new(teams.clone(), irs.clone());
    let team = teams_service
        .create(
            &ldc,
            NewTeam { name: "North Zone".to_string(), created_by: None },
            at(2026, 1, 5, 9, 0, 0),
        )
        .await
        .expect("team created");
    for (member, role) in [(&ldc, Role::Ldc), (&ls, Role::Ls), (&rep, Role::Ir)] {
        teams_service
            .add_member(&ldc, team.id, &member.ir_id, role)
            .await
            .expect("member added");
    }

    Fixture {
        reporting: ReportingService::new(
            scheme,
            activities,
            target_rows.clone(),
            irs.clone(),
            teams.clone(),
        ),
        targets: TargetsService::new(scheme, target_rows, irs, teams),
        teams_service,
        root,
        ldc,
        ls,
        rep,
        outsider,
        team_id: team.id,
    }
}

fn info(recorded_at: cadence_domain::Instant) -> NewInfoDetail {
    NewInfoDetail {
        recorded_at: Some(recorded_at),
        response: InfoResponse::A,
        info_type: None,
        client_name: "client".to_string(),
        comments: None,
    }
}

fn plan(recorded_at: cadence_domain::Instant) -> NewPlanDetail {
    NewPlanDetail {
        recorded_at: Some(recorded_at),
        plan_name: Some("visit".to_string()),
        status: None,
        comments: None,
    }
}

#[tokio::test]
async fn weekly_progress_counts_only_window_hits() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);
    let week_2 = WeekKey::new(2, 2026);

    // Week 2 of 2026: Friday window [Jan 9 21:30, Jan 16 23:45],
    // Monday window [Jan 5 00:00, Jan 11 23:59:59].
    fx.reporting
        .record_infos(
            &fx.rep,
            "REP1",
            vec![
                info(at(2026, 1, 10, 10, 0, 0)),  // inside
                info(at(2026, 1, 9, 21, 29, 59)), // last second of week 1
            ],
            now,
        )
        .await
        .expect("infos recorded");
    fx.reporting
        .record_plans(
            &fx.rep,
            "REP1",
            vec![
                plan(at(2026, 1, 5, 0, 0, 0)),    // first included instant
                plan(at(2026, 1, 11, 23, 59, 59)), // last included instant
                plan(at(2026, 1, 12, 0, 0, 0)),   // next calendar week
            ],
            now,
        )
        .await
        .expect("plans recorded");

    fx.targets
        .set_target(
            &fx.root,
            TargetUpsert {
                week: week_2,
                scope: TargetScope::Ir("REP1".to_string()),
                info_target: 10,
                plan_target: 5,
                uv_target: Some(4),
            },
        )
        .await
        .expect("target stored");

    let progress = fx
        .reporting
        .ir_weekly_progress(&fx.root, "REP1", week_2)
        .await
        .expect("progress computed");

    assert_eq!(progress.info_done, 1);
    assert_eq!(progress.plan_done, 2);
    assert_eq!(progress.info_target, 10);
    assert_eq!(progress.plan_target, 5);
    assert!(progress.has_targets_set);
    // Plain IRs carry no unit-volume numbers, even when the upsert tried.
    assert_eq!(progress.uv_done, None);
    assert_eq!(progress.uv_target, None);
}

#[tokio::test]
async fn friday_tail_appears_in_both_single_week_views() {
    let fx = fixture().await;
    let now = at(2026, 1, 16, 22, 0, 0);
    let tail = at(2026, 1, 16, 23, 0, 0);

    fx.reporting
        .record_infos(&fx.rep, "REP1", vec![info(tail)], now)
        .await
        .expect("info recorded");

    let week_2 = fx.reporting.list_infos(&fx.rep, "REP1", Some(WeekKey::new(2, 2026))).await;
    let week_3 = fx.reporting.list_infos(&fx.rep, "REP1", Some(WeekKey::new(3, 2026))).await;
    assert_eq!(week_2.expect("week 2 listed").len(), 1);
    assert_eq!(week_3.expect("week 3 listed").len(), 1);

    // Unique assignment goes to the week whose window start is the closest
    // one at or before the timestamp.
    assert_eq!(
        fx.reporting.scheme().resolve_week(tail).expect("resolved"),
        WeekKey::new(3, 2026)
    );
}

#[tokio::test]
async fn team_progress_breaks_down_members_and_sums_uv_for_tracking_roles() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);
    let week_2 = WeekKey::new(2, 2026);

    fx.reporting
        .record_infos(&fx.rep, "REP1", vec![info(at(2026, 1, 10, 10, 0, 0))], now)
        .await
        .expect("rep info");
    fx.reporting
        .record_plans(&fx.ls, "LS1", vec![plan(at(2026, 1, 7, 9, 0, 0))], now)
        .await
        .expect("ls plan");
    for count in [3, 2] {
        fx.reporting
            .record_uv(
                &fx.ldc,
                "LDC1",
                NewUvDetail {
                    recorded_at: Some(at(2026, 1, 12, 11, 0, 0)),
                    prospect_name: Some("prospect".to_string()),
                    uv_count: count,
                    comments: None,
                },
                now,
            )
            .await
            .expect("uv recorded");
    }

    fx.targets
        .set_target(
            &fx.root,
            TargetUpsert {
                week: week_2,
                scope: TargetScope::Team(fx.team_id),
                info_target: 20,
                plan_target: 8,
                uv_target: Some(6),
            },
        )
        .await
        .expect("team target stored");

    let progress = fx
        .reporting
        .team_weekly_progress(&fx.ldc, fx.team_id, week_2)
        .await
        .expect("team progress");

    assert_eq!(progress.members.len(), 3);
    assert_eq!(progress.info_done, 1);
    assert_eq!(progress.plan_done, 1);
    assert_eq!(progress.uv_done, 5);
    assert_eq!(progress.info_target, 20);
    assert_eq!(progress.uv_target, Some(6));

    let ldc_line = progress
        .members
        .iter()
        .find(|m| m.ir_id == "LDC1")
        .expect("ldc line present");
    assert_eq!(ldc_line.uv_done, Some(5));
    let rep_line = progress
        .members
        .iter()
        .find(|m| m.ir_id == "REP1")
        .expect("rep line present");
    assert_eq!(rep_line.uv_done, None);
}

#[tokio::test]
async fn dashboard_resolves_the_current_week() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);

    fx.reporting
        .record_infos(&fx.rep, "REP1", vec![info(at(2026, 1, 13, 18, 0, 0))], now)
        .await
        .expect("info recorded");

    let dashboard =
        fx.reporting.dashboard(&fx.rep, "REP1", now).await.expect("dashboard built");
    assert_eq!(dashboard.personal.week, WeekKey::new(2, 2026));
    assert_eq!(dashboard.personal.info_done, 1);
    assert_eq!(dashboard.teams.len(), 1);
    assert_eq!(dashboard.teams[0].team_id, fx.team_id);
}

#[tokio::test]
async fn authorization_follows_the_capability_table() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);

    // An unrelated IR cannot log records for someone else.
    let err = fx
        .reporting
        .record_infos(&fx.outsider, "REP1", vec![info(now)], now)
        .await
        .expect_err("outsider rejected");
    assert!(matches!(err, CadenceError::Forbidden(_)));

    // An LS can log for a teammate.
    fx.reporting
        .record_infos(&fx.ls, "REP1", vec![info(now)], now)
        .await
        .expect("teammate add allowed");

    // A plain IR cannot read an upline's records.
    let err = fx
        .reporting
        .list_infos(&fx.rep, "LDC1", None)
        .await
        .expect_err("upline view rejected");
    assert!(matches!(err, CadenceError::Forbidden(_)));

    // Only target-managing roles may set targets.
    let err = fx
        .targets
        .set_target(
            &fx.ls,
            TargetUpsert {
                week: WeekKey::new(2, 2026),
                scope: TargetScope::Ir("REP1".to_string()),
                info_target: 1,
                plan_target: 1,
                uv_target: None,
            },
        )
        .await
        .expect_err("ls rejected");
    assert!(matches!(err, CadenceError::Forbidden(_)));
}

#[tokio::test]
async fn uv_records_require_a_tracking_role() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);

    let err = fx
        .reporting
        .record_uv(
            &fx.root,
            "REP1",
            NewUvDetail {
                recorded_at: Some(now),
                prospect_name: None,
                uv_count: 1,
                comments: None,
            },
            now,
        )
        .await
        .expect_err("plain ir cannot carry uv");
    assert!(matches!(err, CadenceError::InvalidInput(_)));
}

#[tokio::test]
async fn invalid_week_keys_surface_from_target_and_listing_paths() {
    let fx = fixture().await;

    let err = fx
        .targets
        .set_target(
            &fx.root,
            TargetUpsert {
                week: WeekKey::new(54, 2026),
                scope: TargetScope::Ir("REP1".to_string()),
                info_target: 1,
                plan_target: 1,
                uv_target: None,
            },
        )
        .await
        .expect_err("week 54 rejected");
    assert!(matches!(err, CadenceError::InvalidWeekKey(_)));

    let err = fx
        .reporting
        .list_plans(&fx.rep, "REP1", Some(WeekKey::new(0, 2026)))
        .await
        .expect_err("week 0 rejected");
    assert!(matches!(err, CadenceError::InvalidWeekKey(_)));
}

#[tokio::test]
async fn visible_teams_depend_on_role() {
    let fx = fixture().await;

    let ldc_view = fx.teams_service.visible_teams(&fx.ldc).await.expect("ldc view");
    assert_eq!(ldc_view.len(), 1);

    let root_view = fx.teams_service.visible_teams(&fx.root).await.expect("root view");
    assert_eq!(root_view.len(), 1, "team owner sits inside CTC subtree");

    let outsider_view =
        fx.teams_service.visible_teams(&fx.outsider).await.expect("outsider view");
    assert!(outsider_view.is_empty());

    // Duplicate membership is a conflict.
    let err = fx
        .teams_service
        .add_member(&fx.ldc, fx.team_id, "REP1", Role::Ir)
        .await
        .expect_err("duplicate rejected");
    assert!(matches!(err, CadenceError::Conflict(_)));
}

#[tokio::test]
async fn current_week_listing_exposes_both_windows() {
    let fx = fixture().await;
    let now = at(2026, 1, 14, 10, 0, 0);

    let current = fx.targets.current_week(now).expect("current week");
    assert_eq!(current.week, WeekKey::new(2, 2026));
    assert_eq!(current.friday_window.start, at(2026, 1, 9, 21, 30, 0));
    assert_eq!(current.friday_window.end, at(2026, 1, 16, 23, 45, 0));
    assert_eq!(current.monday_window.start, at(2026, 1, 5, 0, 0, 0));
    assert_eq!(current.monday_window.end, at(2026, 1, 11, 23, 59, 59));

    let weeks = fx.targets.weeks_of_year(2026).expect("year listing");
    assert_eq!(weeks.len(), 52);
    assert_eq!(weeks[1].week, WeekKey::new(2, 2026));
}
