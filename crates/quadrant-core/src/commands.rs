use std::io::Write;
use std::path::Path;

use anyhow::{Context, anyhow};
use quadrant_shared::TaskId;
use tracing::{debug, info, instrument};

use crate::api::TaskApi;
use crate::board::{Board, Prompt};
use crate::classify::Quadrant;
use crate::cli::{AddArgs, Command, ListArgs, ViewSelect};
use crate::config::{Config, resolve_export_dir};
use crate::dispatch::{Mutation, MutationOutcome};
use crate::error::ValidationError;
use crate::export::{ExportKind, export_view};
use crate::render::{OutputFormat, Renderer, RowAction, ViewKind};
use crate::sync::SyncController;

/// Runs one non-interactive command: load, act, reload, print.
#[instrument(skip_all, fields(command = ?command))]
pub async fn dispatch<A, P, W>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    renderer: &Renderer,
    cfg: &Config,
    command: Command,
    out: &mut W,
) -> anyhow::Result<()>
where
    A: TaskApi,
    P: Prompt,
    W: Write,
{
    match command {
        Command::List(args) => cmd_list(sync, renderer, args, out).await,
        Command::Add(args) => cmd_add(sync, prompt, renderer, args, out).await,
        Command::Done { id } => cmd_row_action(sync, prompt, renderer, id, RowAction::MarkDone, out).await,
        Command::Reopen { id } => {
            cmd_row_action(sync, prompt, renderer, id, RowAction::MoveToPending, out).await
        }
        Command::Delete { id, .. } => {
            cmd_row_action(sync, prompt, renderer, id, RowAction::Delete, out).await
        }
        Command::Export { kind, dir } => {
            let dir = resolve_export_dir(cfg, dir.as_deref());
            cmd_export(sync.api(), kind, &dir, out).await
        }
        Command::Login | Command::Signup | Command::Shell => Err(anyhow!(
            "session commands are handled before dispatch"
        )),
    }
}

pub fn write_board<W: Write>(
    renderer: &Renderer,
    board: &Board,
    select: ViewSelect,
    out: &mut W,
) -> anyhow::Result<()> {
    match select {
        ViewSelect::Pending => renderer.write_view(&mut *out, board.pending()),
        ViewSelect::Done => renderer.write_view(&mut *out, board.done()),
        ViewSelect::Both => {
            renderer.write_view(&mut *out, board.pending())?;
            writeln!(out)?;
            renderer.write_view(&mut *out, board.done())
        }
    }
}

pub fn parse_quadrant(args: &AddArgs) -> anyhow::Result<Quadrant> {
    match args.quadrant.as_deref() {
        Some(raw) => Quadrant::parse(raw).ok_or_else(|| {
            anyhow!("unknown quadrant: {raw} (expected imp_urg, notimp_urg, imp_noturg or notimp_noturg)")
        }),
        None => Ok(Quadrant::from_flags(args.important, args.urgent)),
    }
}

async fn cmd_list<A: TaskApi, W: Write>(
    sync: &mut SyncController<A>,
    renderer: &Renderer,
    args: ListArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    if let Some(value) = args.pending_filter.as_deref() {
        sync.board_mut().select_filter(ViewKind::Pending, Some(value));
    }
    if let Some(value) = args.done_filter.as_deref() {
        sync.board_mut().select_filter(ViewKind::Done, Some(value));
    }

    sync.load().await.context("failed to load tasks")?;

    let renderer = if args.html {
        renderer.clone().with_format(OutputFormat::Html)
    } else {
        renderer.clone()
    };
    write_board(&renderer, sync.board(), args.view, out)
}

async fn cmd_add<A: TaskApi, P: Prompt, W: Write>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    renderer: &Renderer,
    args: AddArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    let quadrant = parse_quadrant(&args)?;
    let text = args.text.join(" ");
    if text.trim().is_empty() {
        return Err(ValidationError::EmptyText.into());
    }

    let board = sync.board_mut();
    board.input.set(text);
    board.deadline.set(None);
    if let Some(raw) = args.deadline.as_deref() {
        board.deadline.pick(raw)?;
    }

    let outcome = Mutation::Add(quadrant)
        .execute(sync, prompt)
        .await
        .context("failed to add task")?;

    match outcome {
        MutationOutcome::Reloaded(_) => write_board(renderer, sync.board(), ViewSelect::Pending, out),
        MutationOutcome::Rejected(err) => Err(err.into()),
        MutationOutcome::Declined => Ok(()),
    }
}

async fn cmd_row_action<A: TaskApi, P: Prompt, W: Write>(
    sync: &mut SyncController<A>,
    prompt: &mut P,
    renderer: &Renderer,
    id: TaskId,
    action: RowAction,
    out: &mut W,
) -> anyhow::Result<()> {
    sync.load().await.context("failed to load tasks")?;

    let mutation = sync.board().resolve(&id, action).ok_or_else(|| {
        anyhow!(
            "task {id} is not listed where '{}' applies (check the id and the active filters)",
            action.verb()
        )
    })?;
    debug!(id = %id, action = action.verb(), "resolved row action");

    match mutation
        .execute(sync, prompt)
        .await
        .with_context(|| format!("failed to {} task {id}", action.verb()))?
    {
        MutationOutcome::Declined => {
            writeln!(out, "Deletion cancelled.")?;
            Ok(())
        }
        MutationOutcome::Rejected(err) => Err(anyhow!(err)),
        MutationOutcome::Reloaded(_) => write_board(renderer, sync.board(), ViewSelect::Both, out),
    }
}

async fn cmd_export<A: TaskApi, W: Write>(
    api: &A,
    kind: ExportKind,
    dir: &Path,
    out: &mut W,
) -> anyhow::Result<()> {
    let path = export_view(api, kind, dir).await?;
    info!(path = %path.display(), "export downloaded");
    writeln!(out, "Saved {}", path.display())?;
    Ok(())
}
