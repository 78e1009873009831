pub mod complete;
pub mod render;
pub mod status;

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, level_filters::LevelFilter};

use crate::{
    daemon::start_daemon,
    notify::{
        desktop::DesktopGateway,
        process::{daemon_path, kill_reminder_daemons},
        ReminderScheduler, ScheduleResult, DEFAULT_REMINDER_HOUR, DEFAULT_REMINDER_MINUTE,
    },
    storage::kv::FileKvStore,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Daydose", version, long_about = None)]
#[command(about = "Command line tracker for daily vitamins and habits", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Show every tracked item with today's state and streak")]
    Status {
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Check an item off for today")]
    Done {
        #[arg(help = "Identifier of the tracked item, for example vitamin-d")]
        item: String,
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(about = "Set up the recurring daily reminder")]
    Remind {
        #[arg(long, default_value_t = DEFAULT_REMINDER_HOUR, help = "Hour of the reminder in local time")]
        hour: u32,
        #[arg(long, default_value_t = DEFAULT_REMINDER_MINUTE, help = "Minute of the reminder in local time")]
        minute: u32,
        #[arg(
            long,
            help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
        )]
        dir: Option<PathBuf>,
    },
    #[command(
        about = "Run the reminder loop directly in current console. Used for creating a daemon internally and for debugging"
    )]
    Serve {
        #[arg(long, default_value_t = DEFAULT_REMINDER_HOUR)]
        hour: u32,
        #[arg(long, default_value_t = DEFAULT_REMINDER_MINUTE)]
        minute: u32,
    },
    #[command(about = "Stop a currently running reminder daemon.")]
    Stop {},
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };

    let dir_override = match &args.commands {
        Commands::Status { dir } | Commands::Done { dir, .. } | Commands::Remind { dir, .. } => {
            dir.clone()
        }
        _ => None,
    };
    let app_dir = dir_override
        .clone()
        .map_or_else(create_application_default_path, Ok)?;
    enable_logging(CLI_PREFIX, &app_dir, logging_level, args.log)?;

    match args.commands {
        Commands::Status { .. } => {
            // Scheduling runs on every launch so a denied or skipped attempt gets retried.
            let schedule = ensure_reminder(
                &app_dir,
                dir_override,
                DEFAULT_REMINDER_HOUR,
                DEFAULT_REMINDER_MINUTE,
            )
            .await?;
            debug!("Reminder state on launch {schedule:?}");
            status::process_status_command(&app_dir).await
        }
        Commands::Done { item, .. } => {
            let schedule = ensure_reminder(
                &app_dir,
                dir_override,
                DEFAULT_REMINDER_HOUR,
                DEFAULT_REMINDER_MINUTE,
            )
            .await?;
            debug!("Reminder state on launch {schedule:?}");
            complete::process_done_command(&app_dir, &item).await
        }
        Commands::Remind { hour, minute, .. } => {
            let schedule = ensure_reminder(&app_dir, dir_override, hour, minute).await?;
            match schedule {
                ScheduleResult::AlreadyScheduled => {
                    println!("A daily reminder is already set up.")
                }
                ScheduleResult::Scheduled => {
                    println!("Daily reminder set for {hour:02}:{minute:02}.")
                }
                ScheduleResult::PermissionDenied => {
                    println!("Notifications are unavailable, the reminder was not set up.")
                }
                ScheduleResult::Skipped => {
                    println!("No notification endpoint in this session, nothing to set up.")
                }
            }
            Ok(())
        }
        Commands::Serve { hour, minute } => start_daemon(hour, minute).await,
        Commands::Stop {} => {
            kill_reminder_daemons(&daemon_path()?);
            Ok(())
        }
    }
}

/// State files live in their own directory next to the logs.
pub fn state_store(app_dir: &Path) -> Result<FileKvStore, std::io::Error> {
    FileKvStore::new(app_dir.join("state"))
}

async fn ensure_reminder(
    app_dir: &Path,
    dir_override: Option<PathBuf>,
    hour: u32,
    minute: u32,
) -> Result<ScheduleResult> {
    let mut scheduler = ReminderScheduler::new(
        state_store(app_dir)?,
        Box::new(DesktopGateway::new(dir_override)),
    );
    scheduler.ensure_daily_reminder(hour, minute).await
}
