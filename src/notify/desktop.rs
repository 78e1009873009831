use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use super::{process::restart_reminder_daemon, NotificationGateway, Permission, ReminderSink};

/// Desktop realization of [NotificationGateway]. Desktop sessions have no runtime permission
/// prompt, so reachability of the notification server plays the role of the permission.
pub struct DesktopGateway {
    state_dir: Option<PathBuf>,
}

impl DesktopGateway {
    pub fn new(state_dir: Option<PathBuf>) -> Self {
        Self { state_dir }
    }

    fn probe_server(&self) -> Permission {
        cfg_if::cfg_if! {
            if #[cfg(all(unix, not(target_os = "macos")))] {
                match notify_rust::get_server_information() {
                    Ok(server) => {
                        debug!("Found notification server {} {}", server.name, server.version);
                        Permission::Granted
                    }
                    Err(e) => {
                        info!("Notification server is unreachable {e}");
                        Permission::Denied
                    }
                }
            } else {
                Permission::Granted
            }
        }
    }
}

impl NotificationGateway for DesktopGateway {
    fn is_available(&self) -> bool {
        cfg_if::cfg_if! {
            if #[cfg(all(unix, not(target_os = "macos")))] {
                // Headless sessions (ssh, ci) have no bus to talk to.
                ["DBUS_SESSION_BUS_ADDRESS", "WAYLAND_DISPLAY", "DISPLAY"]
                    .iter()
                    .any(|v| std::env::var_os(v).is_some())
            } else {
                true
            }
        }
    }

    fn check_permission(&mut self) -> Result<Permission> {
        Ok(self.probe_server())
    }

    fn request_permission(&mut self) -> Result<Permission> {
        // There is nothing to prompt for, probing again is the most a desktop session can do.
        Ok(self.probe_server())
    }

    fn schedule_recurring(
        &mut self,
        _title: &str,
        _body: &str,
        hour: u32,
        minute: u32,
    ) -> Result<()> {
        restart_reminder_daemon(hour, minute, self.state_dir.as_deref())
    }
}

/// Immediate delivery through the desktop notification server.
pub struct DesktopSink;

impl ReminderSink for DesktopSink {
    fn notify(&mut self, title: &str, body: &str) -> Result<()> {
        // The handle is dropped on purpose, nothing ever updates or cancels a shown reminder.
        notify_rust::Notification::new()
            .summary(title)
            .body(body)
            .show()?;
        Ok(())
    }
}
