mod common;

use common::{FakeApi, RecordingPrompt, controller, day, done_task, task};
use quadrant_core::cli::{AddArgs, Command};
use quadrant_core::commands;
use quadrant_core::config::Config;
use quadrant_core::dispatch::{self, DELETE_PROMPT, Mutation, MutationOutcome};
use quadrant_core::error::{ExportError, ValidationError};
use quadrant_core::export::{ExportKind, ExportPayload, export_view};
use quadrant_core::filter::QuadrantFilter;
use quadrant_core::render::{DONE_GLYPH, OutputFormat, Renderer, RowAction, ViewKind};
use quadrant_shared::TaskId;
use tempfile::tempdir;

fn ids(rows: &[quadrant_core::render::Row]) -> Vec<String> {
    rows.iter().map(|row| row.id.to_string()).collect()
}

#[tokio::test]
async fn add_toggle_reopen_delete_round_trip() {
    let mut sync = controller(FakeApi::default());
    let mut prompt = RecordingPrompt::answering(true);

    assert!(sync.load().await.expect("initial load").is_empty());

    let outcome = dispatch::add(&mut sync, &mut prompt, "Plan Q3", true, true, Some(day(2024, 6, 1)))
        .await
        .expect("add");
    let MutationOutcome::Reloaded(snapshot) = outcome else {
        panic!("expected reload, got {outcome:?}");
    };
    assert_eq!(snapshot.len(), 1);
    assert!(sync.board().input.value().is_empty());
    assert_eq!(sync.board().deadline.value(), None);

    let row = &sync.board().pending().rows()[0];
    assert_eq!(row.text, "Plan Q3");
    assert_eq!(row.priority, "Important & Urgent");
    assert_eq!(row.style, "prio-critical");
    assert_eq!(row.deadline, "01-06-2024");
    assert_eq!(row.created, "05-03-2024 10:15 AM");
    let id = row.id.clone();

    assert_eq!(sync.board().resolve(&id, RowAction::MoveToPending), None);
    let mark_done = sync
        .board()
        .resolve(&id, RowAction::MarkDone)
        .expect("pending row offers done");
    assert_eq!(mark_done, Mutation::Toggle(id.clone()));
    mark_done.execute(&mut sync, &mut prompt).await.expect("toggle");

    assert!(sync.board().pending().is_empty());
    let done = &sync.board().done().rows()[0];
    assert_eq!(done.status, Some(DONE_GLYPH));
    assert_eq!(done.completed.as_deref(), Some("06-03-2024 09:00 AM"));
    assert_eq!(sync.board().resolve(&id, RowAction::Delete), None);

    assert_eq!(
        sync.board().resolve(&id, RowAction::MoveToPending),
        Some(Mutation::Toggle(id.clone()))
    );
    dispatch::toggle(&mut sync, &mut prompt, id.clone())
        .await
        .expect("reopen");
    assert_eq!(ids(sync.board().pending().rows()), vec![id.to_string()]);

    let outcome = dispatch::remove(&mut sync, &mut prompt, id).await.expect("delete");
    assert!(matches!(outcome, MutationOutcome::Reloaded(ref s) if s.is_empty()));
    assert_eq!(prompt.confirms, vec![DELETE_PROMPT.to_string()]);
    assert!(sync.board().pending().is_empty());
    assert!(sync.board().done().is_empty());

    let calls = sync.api().calls();
    assert_eq!(calls.create, 1);
    assert_eq!(calls.toggle, 2);
    assert_eq!(calls.delete, 1);
    assert_eq!(calls.list, 5);
    assert_eq!(sync.reloads(), 5);
}

#[tokio::test]
async fn blank_text_is_rejected_without_a_request() {
    let mut sync = controller(FakeApi::default());
    let mut prompt = RecordingPrompt::default();

    let outcome = dispatch::add(&mut sync, &mut prompt, "   ", false, true, None)
        .await
        .expect("validation is not a network failure");

    assert_eq!(outcome, MutationOutcome::Rejected(ValidationError::EmptyText));
    assert_eq!(prompt.alerts, vec!["Please enter a task before adding".to_string()]);
    assert!(sync.board().input.is_focused());
    assert_eq!(sync.api().calls().create, 0);
    assert_eq!(sync.api().calls().list, 0);
}

#[tokio::test]
async fn declined_delete_changes_nothing() {
    let mut sync = controller(FakeApi::with_tasks(vec![task(3, "Keep me", false, false, None)]));
    let mut prompt = RecordingPrompt::answering(false);
    sync.load().await.expect("load");

    let outcome = dispatch::remove(&mut sync, &mut prompt, TaskId::from(3))
        .await
        .expect("declined");

    assert_eq!(outcome, MutationOutcome::Declined);
    assert_eq!(sync.api().calls().delete, 0);
    assert_eq!(sync.api().calls().list, 1);
    assert_eq!(ids(sync.board().pending().rows()), vec!["3"]);
}

#[tokio::test]
async fn failed_request_keeps_inputs_and_views() {
    let api = FakeApi::with_tasks(vec![task(1, "Existing", true, false, None)]);
    let mut sync = controller(api);
    let mut prompt = RecordingPrompt::default();
    sync.load().await.expect("load");

    sync.api().fail_mutations(true);
    let err = dispatch::add(&mut sync, &mut prompt, "Write report", true, false, None)
        .await
        .expect_err("create fails");
    assert!(err.to_string().contains("HTTP 500"));
    assert_eq!(sync.board().input.value(), "Write report");
    assert_eq!(sync.reloads(), 1);
    assert_eq!(ids(sync.board().pending().rows()), vec!["1"]);
}

#[tokio::test]
async fn failed_reload_leaves_previous_state_and_recovers() {
    let mut sync = controller(FakeApi::with_tasks(vec![
        task(1, "First", true, true, None),
        done_task(2, "Finished"),
    ]));
    sync.load().await.expect("load");
    let before = sync.board().pending().rows().to_vec();

    sync.api().fail_list(true);
    assert!(sync.load().await.is_err());
    assert_eq!(sync.board().pending().rows(), before.as_slice());
    assert_eq!(sync.board().done().len(), 1);
    assert_eq!(sync.snapshot().map(|s| s.len()), Some(2));
    assert_eq!(sync.reloads(), 1);

    sync.api().fail_list(false);
    sync.load().await.expect("recovered");
    assert_eq!(sync.reloads(), 2);
}

#[tokio::test]
async fn pending_sorts_by_deadline_and_done_keeps_server_order() {
    let mut sync = controller(FakeApi::with_tasks(vec![
        task(1, "no deadline", false, false, None),
        done_task(9, "finished late"),
        task(2, "later", false, false, Some(day(2024, 4, 1))),
        task(3, "sooner", false, false, Some(day(2024, 3, 10))),
        task(4, "also no deadline", false, false, None),
        done_task(5, "finished early"),
    ]));
    sync.load().await.expect("load");

    assert_eq!(ids(sync.board().pending().rows()), vec!["3", "2", "1", "4"]);
    assert_eq!(ids(sync.board().done().rows()), vec!["9", "5"]);
    assert_eq!(sync.board().pending().rows()[2].deadline, "No deadline");

    let again = sync.board().pending().rows().to_vec();
    sync.rerender();
    assert_eq!(sync.board().pending().rows(), again.as_slice());
}

#[tokio::test]
async fn filter_change_reloads_and_unknown_values_show_everything() {
    let mut sync = controller(FakeApi::with_tasks(vec![
        task(1, "do", true, true, None),
        task(2, "delegate", false, true, None),
        task(3, "schedule", true, false, None),
        task(4, "drop", false, false, None),
    ]));
    sync.load().await.expect("load");
    assert_eq!(sync.board().pending().len(), 4);

    sync.set_filter(ViewKind::Pending, Some("notimp_urg"))
        .await
        .expect("filtered reload");
    assert_eq!(sync.api().calls().list, 2);
    assert_eq!(sync.board().filter(ViewKind::Pending), QuadrantFilter::parse(Some("notimp_urg")));
    assert_eq!(ids(sync.board().pending().rows()), vec!["2"]);
    assert_eq!(sync.board().filter(ViewKind::Done), QuadrantFilter::All);

    sync.set_filter(ViewKind::Pending, Some("sideways"))
        .await
        .expect("fail-open reload");
    assert_eq!(sync.board().pending().len(), 4);
}

#[tokio::test]
async fn export_saves_under_the_served_name() {
    let api = FakeApi::default();
    api.serve_export(Some(ExportPayload {
        disposition: Some(r#"attachment; filename="done_tasks_20240305.xlsx""#.to_string()),
        bytes: b"PK\x03\x04sheet".to_vec(),
    }));
    let dir = tempdir().expect("tempdir");

    let path = export_view(&api, ExportKind::Done, dir.path()).await.expect("export");
    assert_eq!(path, dir.path().join("done_tasks_20240305.xlsx"));
    assert_eq!(std::fs::read(&path).expect("read"), b"PK\x03\x04sheet");

    let second = export_view(&api, ExportKind::Done, dir.path()).await.expect("export again");
    assert_eq!(second, dir.path().join("done_tasks_20240305 (1).xlsx"));
}

#[tokio::test]
async fn failed_export_writes_nothing() {
    let api = FakeApi::default();
    let dir = tempdir().expect("tempdir");

    let err = export_view(&api, ExportKind::Pending, dir.path())
        .await
        .expect_err("server error");
    assert!(matches!(err, ExportError::Network(_)));
    assert_eq!(err.to_string(), "Export failed: Internal Server Error");
    assert_eq!(std::fs::read_dir(dir.path()).expect("read dir").count(), 0);
}

#[tokio::test]
async fn add_sends_trimmed_text() {
    let mut sync = controller(FakeApi::default());
    let mut prompt = RecordingPrompt::default();

    dispatch::add(&mut sync, &mut prompt, "  Plan  ", false, false, None)
        .await
        .expect("add");

    let tasks = sync.api().tasks();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].text, "Plan");
}

fn add_command(text: &str, deadline: Option<&str>) -> Command {
    Command::Add(AddArgs {
        text: vec![text.to_string()],
        quadrant: None,
        important: true,
        urgent: false,
        deadline: deadline.map(str::to_string),
    })
}

#[tokio::test]
async fn cli_add_reports_blank_text_once_before_the_deadline() {
    let mut sync = controller(FakeApi::default());
    let mut prompt = RecordingPrompt::default();
    let renderer = Renderer::plain(OutputFormat::Table);
    let cfg = Config::defaults();
    let mut out = Vec::new();

    let err = commands::dispatch(
        &mut sync,
        &mut prompt,
        &renderer,
        &cfg,
        add_command("   ", Some("2000-01-01")),
        &mut out,
    )
    .await
    .expect_err("blank text");

    assert_eq!(format!("{err:#}"), "Please enter a task before adding");
    assert!(prompt.alerts.is_empty());
    assert_eq!(sync.api().calls().create, 0);

    commands::dispatch(
        &mut sync,
        &mut prompt,
        &renderer,
        &cfg,
        add_command("Write report", Some("2024-04-01")),
        &mut out,
    )
    .await
    .expect("add");
    let tasks = sync.api().tasks();
    assert_eq!(tasks[0].deadline, Some(day(2024, 4, 1)));
    assert!(String::from_utf8(out).expect("utf8").contains("Write report"));
}
