pub mod api;
pub mod board;
pub mod classify;
pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod filter;
pub mod render;
pub mod shell;
pub mod sync;

use std::ffi::OsString;
use std::io::{
  self,
  Write
};

use anyhow::{
  Context,
  anyhow
};
use chrono::Local;
use clap::Parser;
use tracing::{
  debug,
  info,
  warn
};

use crate::api::HttpTaskApi;
use crate::board::{
  Board,
  TerminalPrompt
};
use crate::cli::{
  Command,
  ListArgs
};
use crate::filter::QuadrantFilter;
use crate::sync::SyncController;

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let pre =
    cli::preprocess_args(&raw_args)?;
  let cli = cli::GlobalCli::parse_from(
    pre.cleaned_args
  );

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting quadrant CLI"
  );
  debug!(?pre.rc_overrides, "preprocessed rc overrides");

  let mut cfg = config::Config::load(
    cli.quadrantrc.as_deref()
  )?;
  cfg.apply_overrides(
    pre.rc_overrides.into_iter().chain(
      cli
        .rc_overrides
        .into_iter()
        .map(|kv| (kv.key, kv.value))
    )
  );
  if let Some(server) = cli.server {
    cfg.apply_overrides([(
      "server.url".to_string(),
      server
    )]);
  }

  let command =
    cli.command.unwrap_or_else(|| {
      Command::List(ListArgs::default())
    });

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async runtime"
      )?;

  let api = HttpTaskApi::from_config(&cfg)?;
  info!(server = %api.base(), "task service");

  let credentials = cfg.credentials()?;
  match command {
    | Command::Login | Command::Signup => {
      let creds =
        credentials.ok_or_else(|| {
          anyhow!(
            "set auth.username and \
             auth.password (or \
             QUADRANT_PASSWORD) first"
          )
        })?;
      let signup =
        matches!(command, Command::Signup);
      runtime.block_on(async {
        if signup {
          api.signup(&creds).await
        } else {
          api.login(&creds).await
        }
      })?;
      let mut out = io::stdout().lock();
      if signup {
        writeln!(
          out,
          "Account created for {}.",
          creds.username
        )?;
      } else {
        writeln!(
          out,
          "Logged in as {}.",
          creds.username
        )?;
      }
      return Ok(());
    }
    | _ => {}
  }

  let logged_in = match &credentials {
    | Some(creds) => {
      runtime
        .block_on(api.login(creds))
        .context("login failed")?;
      true
    }
    | None => false
  };

  let today = Local::now().date_naive();
  let board = Board::new(today)
    .with_filters(
      QuadrantFilter::parse(
        cfg.get("filter.pending").as_deref()
      ),
      QuadrantFilter::parse(
        cfg.get("filter.done").as_deref()
      )
    );
  let renderer =
    render::Renderer::new(&cfg)?;

  let skip_confirm = !cfg
    .get_bool("confirm")
    .unwrap_or(true)
    || matches!(
      command,
      Command::Delete { yes: true, .. }
    );
  let mut prompt =
    TerminalPrompt::new(skip_confirm);
  let mut sync =
    SyncController::new(api, board);

  if matches!(command, Command::Shell) {
    let export_dir =
      config::resolve_export_dir(
        &cfg, None
      );
    let lines = std::iter::from_fn(|| {
      let mut line = String::new();
      match io::stdin().read_line(&mut line)
      {
        | Ok(0) => None,
        | Ok(_) => Some(Ok(line)),
        | Err(err) => Some(Err(err))
      }
    });

    let mut shell = shell::Shell::new(
      sync,
      prompt,
      renderer,
      export_dir,
      io::stdout()
    );
    shell.run(&runtime, lines)?;

    if logged_in
      && let Err(err) = runtime.block_on(
        shell.sync().api().logout()
      )
    {
      warn!(error = %err, "logout failed");
    }
  } else {
    let mut out = io::stdout().lock();
    runtime.block_on(commands::dispatch(
      &mut sync,
      &mut prompt,
      &renderer,
      &cfg,
      command,
      &mut out
    ))?;
  }

  info!("done");
  Ok(())
}
