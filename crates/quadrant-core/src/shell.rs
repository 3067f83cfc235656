use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, anyhow};
use quadrant_shared::TaskId;
use tokio::runtime::Runtime;
use tracing::{debug, info, instrument, warn};

use crate::api::TaskApi;
use crate::board::Prompt;
use crate::classify::Quadrant;
use crate::cli::ViewSelect;
use crate::commands::write_board;
use crate::dispatch::{Mutation, MutationOutcome};
use crate::error::ExportError;
use crate::export::{ExportKind, export_view};
use crate::render::{Renderer, RowAction, ViewKind};
use crate::sync::SyncController;

const HELP: &str = "\
commands:
  add <quadrant> [by:<deadline>] <text...>   quadrant: imp_urg notimp_urg imp_noturg notimp_noturg
  done <id>                                  pending task -> done
  reopen <id>                                done task -> pending
  delete <id>                                delete a pending task (asks first)
  filter <pending|done> [quadrant|all]       change a view's quadrant filter
  export <pending|done|all>                  download a view as a spreadsheet
  reload | show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellEvent {
    Add {
        quadrant: Quadrant,
        deadline: Option<String>,
        text: String,
    },
    Row {
        id: TaskId,
        action: RowAction,
    },
    Filter {
        view: ViewKind,
        value: String,
    },
    Export(ExportKind),
    Reload,
    Show,
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// One input line to an event. Blank lines are `Ok(None)`; the error
/// string is a usage message for the user.
pub fn parse_line(line: &str) -> Result<Option<ShellEvent>, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(None);
    };

    let event = match head.to_ascii_lowercase().as_str() {
        "add" | "a" => {
            let raw = words
                .next()
                .ok_or("usage: add <quadrant> [by:<deadline>] <text...>")?;
            let quadrant = Quadrant::parse(raw).ok_or_else(|| format!("unknown quadrant: {raw}"))?;

            let mut deadline = None;
            let mut text = Vec::new();
            for word in words {
                match word.strip_prefix("by:") {
                    Some(value) => deadline = Some(value.to_string()),
                    None => text.push(word),
                }
            }
            ShellEvent::Add {
                quadrant,
                deadline,
                text: text.join(" "),
            }
        }
        "done" | "d" => row_event(words.next(), RowAction::MarkDone)?,
        "reopen" | "undo" => row_event(words.next(), RowAction::MoveToPending)?,
        "delete" | "rm" => row_event(words.next(), RowAction::Delete)?,
        "filter" | "f" => {
            let view = match words.next() {
                Some("pending") => ViewKind::Pending,
                Some("done") => ViewKind::Done,
                _ => return Err("usage: filter <pending|done> [quadrant|all]".to_string()),
            };
            ShellEvent::Filter {
                view,
                value: words.next().unwrap_or("all").to_string(),
            }
        }
        "export" | "x" => {
            let kind = match words.next() {
                Some("pending") => ExportKind::Pending,
                Some("done") => ExportKind::Done,
                Some("all") => ExportKind::All,
                _ => return Err("usage: export <pending|done|all>".to_string()),
            };
            ShellEvent::Export(kind)
        }
        "reload" | "r" => ShellEvent::Reload,
        "show" | "ls" => ShellEvent::Show,
        "help" | "?" => ShellEvent::Help,
        "quit" | "exit" | "q" => ShellEvent::Quit,
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };

    Ok(Some(event))
}

fn row_event(id: Option<&str>, action: RowAction) -> Result<ShellEvent, String> {
    let id = id
        .ok_or_else(|| format!("usage: {} <id>", action.verb()))?
        .parse::<TaskId>()?;
    Ok(ShellEvent::Row { id, action })
}

/// Line-driven session over one controller. Each event runs to
/// completion, reload included, before the next line is read.
pub struct Shell<A, P, W> {
    sync: SyncController<A>,
    prompt: P,
    renderer: Renderer,
    export_dir: PathBuf,
    out: W,
}

impl<A, P, W> Shell<A, P, W>
where
    A: TaskApi,
    P: Prompt,
    W: Write,
{
    pub fn new(
        sync: SyncController<A>,
        prompt: P,
        renderer: Renderer,
        export_dir: PathBuf,
        out: W,
    ) -> Self {
        Self {
            sync,
            prompt,
            renderer,
            export_dir,
            out,
        }
    }

    pub fn sync(&self) -> &SyncController<A> {
        &self.sync
    }

    pub fn out(&self) -> &W {
        &self.out
    }

    /// Reads lines until `quit` or end of input. Failed events are
    /// reported and the session carries on.
    pub fn run<L>(&mut self, runtime: &Runtime, lines: L) -> anyhow::Result<()>
    where
        L: IntoIterator<Item = io::Result<String>>,
    {
        if let Err(err) = runtime.block_on(self.handle(ShellEvent::Reload)) {
            writeln!(self.out, "error: {err:#}")?;
        }

        for line in lines {
            let line = line.context("failed to read input")?;
            match parse_line(&line) {
                Ok(None) => continue,
                Err(usage) => writeln!(self.out, "{usage}")?,
                Ok(Some(event)) => match runtime.block_on(self.handle(event)) {
                    Ok(Flow::Quit) => break,
                    Ok(Flow::Continue) => {}
                    Err(err) => {
                        warn!(error = %err, "shell event failed");
                        writeln!(self.out, "error: {err:#}")?;
                    }
                },
            }
        }

        info!(reloads = self.sync.reloads(), "shell finished");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn handle(&mut self, event: ShellEvent) -> anyhow::Result<Flow> {
        match event {
            ShellEvent::Add {
                quadrant,
                deadline,
                text,
            } => {
                // One line is the whole form: nothing carries over from a
                // previous add.
                let board = self.sync.board_mut();
                board.input.set(text);
                board.deadline.set(None);
                if let Some(raw) = deadline.as_deref()
                    && let Err(err) = board.deadline.pick(raw)
                {
                    self.prompt.alert(&err.to_string());
                    return Ok(Flow::Continue);
                }
                let outcome = Mutation::Add(quadrant)
                    .execute(&mut self.sync, &mut self.prompt)
                    .await?;
                self.after(outcome, ViewSelect::Pending)?;
            }
            ShellEvent::Row { id, action } => {
                let Some(mutation) = self.sync.board().resolve(&id, action) else {
                    writeln!(
                        self.out,
                        "no row {id} with a '{}' action in the current views",
                        action.verb()
                    )?;
                    return Ok(Flow::Continue);
                };
                let outcome = mutation.execute(&mut self.sync, &mut self.prompt).await?;
                self.after(outcome, ViewSelect::Both)?;
            }
            ShellEvent::Filter { view, value } => {
                self.sync
                    .set_filter(view, Some(&value))
                    .await
                    .context("failed to reload tasks")?;
                let select = match view {
                    ViewKind::Pending => ViewSelect::Pending,
                    ViewKind::Done => ViewSelect::Done,
                };
                write_board(&self.renderer, self.sync.board(), select, &mut self.out)?;
            }
            ShellEvent::Export(kind) => match export_view(self.sync.api(), kind, &self.export_dir).await {
                Ok(path) => writeln!(self.out, "Saved {}", path.display())?,
                Err(err @ ExportError::Network(_)) => self.prompt.alert(&err.to_string()),
                Err(err) => return Err(anyhow!(err)),
            },
            ShellEvent::Reload => {
                self.sync.load().await.context("failed to reload tasks")?;
                write_board(&self.renderer, self.sync.board(), ViewSelect::Both, &mut self.out)?;
            }
            ShellEvent::Show => {
                write_board(&self.renderer, self.sync.board(), ViewSelect::Both, &mut self.out)?;
            }
            ShellEvent::Help => writeln!(
                self.out,
                "{HELP}\ndeadlines: YYYY-MM-DD, DD-MM-YYYY, today, tomorrow, +Nd or +Nw, no earlier than {}",
                self.sync.board().deadline.min_attr()
            )?,
            ShellEvent::Quit => return Ok(Flow::Quit),
        }

        Ok(Flow::Continue)
    }

    fn after(&mut self, outcome: MutationOutcome, select: ViewSelect) -> anyhow::Result<()> {
        match outcome {
            MutationOutcome::Reloaded(snapshot) => {
                debug!(tasks = snapshot.len(), "views refreshed");
                write_board(&self.renderer, self.sync.board(), select, &mut self.out)
            }
            MutationOutcome::Rejected(_) => Ok(()),
            MutationOutcome::Declined => {
                writeln!(self.out, "Deletion cancelled.")?;
                Ok(())
            }
        }
    }
}
