use std::path::Path;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::{
    storage::item_store::ItemStore,
    tracker::controller::CompletionController,
    utils::clock::DefaultClock,
};

use super::{render, state_store};

/// Command to process `status`. Prints every tracked item with its done-today marker and the
/// current streak.
pub async fn process_status_command(app_dir: &Path) -> Result<()> {
    let (sender, _receiver) = mpsc::channel(16);
    let controller = CompletionController::restore(
        ItemStore::new(state_store(app_dir)?),
        sender,
        Box::new(DefaultClock),
    )
    .await;

    render::print_status(&controller.status());
    Ok(())
}
