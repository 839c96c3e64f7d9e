pub mod cli;
pub mod commands;
pub mod config;
pub mod file_store;
pub mod host;
pub mod render;
pub mod shell;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
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
    "starting tasklist CLI"
  );
  debug!(rc_overrides = ?cli.rc_overrides, "parsed overrides");

  let mut cfg = config::Config::load(
    cli.config.as_deref()
  )?;
  cfg.apply_overrides(
    cli
      .rc_overrides
      .into_iter()
      .map(|kv| (kv.key, kv.value))
  )?;

  let data_dir =
    config::resolve_data_dir(
      &cfg,
      cli.data.as_deref()
    )
    .context(
      "failed to resolve data \
       directory"
    )?;

  let storage =
    file_store::FileStore::open(
      &data_dir
    )
    .with_context(|| {
      format!(
        "failed to open task storage \
         at {}",
        data_dir.display()
      )
    })?;

  let renderer =
    render::Renderer::new(&cfg);
  let mut host =
    host::Host::start(&cfg, storage);

  let command = cli.command.unwrap_or(
    cli::Command::List(
      cli::FilterArgs::default()
    )
  );

  commands::dispatch(
    &mut host,
    &renderer,
    command
  )?;

  info!("done");
  Ok(())
}
