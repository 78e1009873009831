use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{
    notify::desktop::DesktopSink,
    utils::clock::DefaultClock,
};

pub mod args;
pub mod reminder;
pub mod shutdown;

use reminder::ReminderModule;

/// Represents the starting point for the reminder daemon.
pub async fn start_daemon(hour: u32, minute: u32) -> Result<()> {
    std::env::set_current_dir("/")?;

    let shutdown_token = CancellationToken::new();

    let module = ReminderModule::new(
        Box::new(DesktopSink),
        shutdown_token.clone(),
        hour,
        minute,
        Box::new(DefaultClock),
    );

    let (_, reminder_result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token),
        module.run(),
    );

    if let Err(reminder_result) = reminder_result {
        error!("Reminder module got an error {:?}", reminder_result);
    }

    Ok(())
}
