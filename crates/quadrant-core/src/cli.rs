use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use quadrant_shared::TaskId;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::export::ExportKind;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "quadrant",
    version,
    about = "Eisenhower-matrix task list synced against a remote task service"
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "quadrantrc", global = true)]
    pub quadrantrc: Option<PathBuf>,

    /// Base URL of the task service; overrides `server.url`.
    #[arg(long = "server", global = true)]
    pub server: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the pending and done views.
    List(ListArgs),
    /// Create a task in one quadrant.
    Add(AddArgs),
    /// Mark a pending task done.
    Done { id: TaskId },
    /// Move a done task back to pending.
    Reopen { id: TaskId },
    /// Delete a pending task.
    Delete {
        id: TaskId,
        /// Skip the confirmation prompt.
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Download the spreadsheet export for a view.
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        #[arg(long = "dir")]
        dir: Option<PathBuf>,
    },
    /// Check the configured credentials against the service.
    Login,
    /// Create an account with the configured credentials.
    Signup,
    /// Interactive session: one line per action.
    Shell,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum, Default)]
pub enum ViewSelect {
    Pending,
    Done,
    #[default]
    Both,
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long = "view", value_enum, default_value_t = ViewSelect::Both)]
    pub view: ViewSelect,

    #[arg(long = "pending-filter")]
    pub pending_filter: Option<String>,

    #[arg(long = "done-filter")]
    pub done_filter: Option<String>,

    /// Emit table-row markup instead of a text table.
    #[arg(long = "html")]
    pub html: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// imp_urg, notimp_urg, imp_noturg, notimp_noturg (or do, delegate,
    /// schedule, drop).
    #[arg(long = "quadrant", conflicts_with_all = ["important", "urgent"])]
    pub quadrant: Option<String>,

    #[arg(short = 'i', long = "important")]
    pub important: bool,

    #[arg(short = 'u', long = "urgent")]
    pub urgent: bool,

    #[arg(short = 'd', long = "deadline")]
    pub deadline: Option<String>,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}

/// Pulls positional `rc.key=value` / `rc.key:value` overrides out of the
/// argument list before clap sees it.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}
