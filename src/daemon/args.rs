use std::path::PathBuf;

use clap::Parser;
use tracing::level_filters::LevelFilter;

use crate::notify::{DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE};

#[derive(Parser)]
pub struct DaemonArgs {
  #[arg(long)]
  pub force: bool,
  #[arg(long)]
  pub dir: Option<PathBuf>,
  #[arg(long, default_value_t = DEFAULT_REMINDER_HOUR)]
  pub hour: u32,
  #[arg(long, default_value_t = DEFAULT_REMINDER_MINUTE)]
  pub minute: u32,
  /// This option is for debugging purposes only.
  #[arg(long = "log-console")]
  pub log_console : bool,
  #[arg(long = "log-filter")]
  pub log: Option<LevelFilter>
}
