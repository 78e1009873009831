use std::path::Path;

use anyhow::Result;
use clap::CommandFactory;
use tokio::sync::mpsc;

use crate::{
    storage::item_store::ItemStore,
    tracker::{controller::CompletionController, events::StateEvent},
    utils::clock::DefaultClock,
};

use super::{render, state_store, Args};

/// Command to process `done`. Marks an item as completed for the current day and renders the
/// celebration plus, on a milestone crossing, the toast.
pub async fn process_done_command(app_dir: &Path, item: &str) -> Result<()> {
    let (sender, mut receiver) = mpsc::channel::<StateEvent>(16);
    let mut controller = CompletionController::restore(
        ItemStore::new(state_store(app_dir)?),
        sender,
        Box::new(DefaultClock),
    )
    .await;

    if !controller.items().iter().any(|v| &*v.id == item) {
        let known = controller
            .items()
            .iter()
            .map(|v| v.id.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("No tracked item named {item}. Tracked items are: {known}"),
            )
            .into());
    }

    let completion = controller.mark_complete(item).await?;

    if completion.streak_before == completion.streak_after {
        println!("{} is already checked off for today.", completion.name);
    }
    while let Ok(event) = receiver.try_recv() {
        match event {
            StateEvent::ItemUpdated { .. } => {}
            StateEvent::Celebration { name } => render::print_celebration(&name),
            StateEvent::MilestoneReached { name, streak } => {
                render::print_milestone_toast(&name, streak)
            }
        }
    }

    render::print_status(&controller.status());

    controller.finalize().await;
    Ok(())
}
