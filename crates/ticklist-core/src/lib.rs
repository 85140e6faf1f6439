pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod persistence;
pub mod prefs;
pub mod projection;
pub mod render;
pub mod session;
pub mod shell;
pub mod store;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
pub use ticklist_shared::{
  Filter,
  Icon,
  Task,
  TaskDraft,
  TaskId,
  TaskPatch,
  ThemeColor,
  ThemeMode
};
use tracing::{
  debug,
  info
};

#[tracing::instrument(skip_all)]
pub fn run(
  raw_args: Vec<OsString>
) -> anyhow::Result<()> {
  let cli =
    cli::GlobalCli::parse_from(raw_args);

  cli::init_tracing(
    cli.verbose,
    cli.quiet
  )?;

  info!(
    verbose = cli.verbose,
    quiet = cli.quiet,
    "starting ticklist"
  );
  debug!(command = ?cli.command, "parsed command line");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  );

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let runtime =
    tokio::runtime::Builder::new_current_thread()
      .enable_all()
      .build()
      .context(
        "failed to start async \
         runtime"
      )?;

  let command = cli.command.unwrap_or(
    cli::Command::List {
      filter: Filter::All
        .as_str()
        .to_string()
    }
  );

  runtime.block_on(async {
    let storage =
      persistence::FileKvStore::open(
        &data_dir
      )
      .with_context(|| {
        format!(
          "failed to open storage at {}",
          data_dir.display()
        )
      })?;

    let backend =
      persistence::Backend::from_config(
        &cfg,
        storage.clone()
      )?;
    let mut app = app::TodoApp::start(
      backend,
      Box::new(storage)
    )
    .await;

    let mut renderer =
      render::Renderer::new(
        &cfg,
        app.preferences()
      )?;

    commands::dispatch(
      &mut app,
      &cfg,
      &mut renderer,
      command
    )
    .await
  })?;

  info!("done");
  Ok(())
}
