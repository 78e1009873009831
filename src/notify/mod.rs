//! Reminder scheduling and the contract for delivering notifications. The rest of the crate
//! treats delivery as fire-and-forget: schedule once, the device clock does the rest.

pub mod desktop;
pub mod process;

use anyhow::Result;
use tracing::{info, warn};

use crate::storage::kv::KeyValueStore;

pub const REMINDER_TITLE: &str = "Daydose";
pub const REMINDER_BODY: &str = "Time to take your vitamins";

pub const DEFAULT_REMINDER_HOUR: u32 = 9;
pub const DEFAULT_REMINDER_MINUTE: u32 = 0;

/// Key holding the one-byte schedule flag.
pub const REMINDER_FLAG_KEY: &str = "reminder";
const FLAG_SET: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

/// What happened to a scheduling attempt. Only `Scheduled` flips the durable flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleResult {
    AlreadyScheduled,
    Scheduled,
    PermissionDenied,
    Skipped,
}

/// Contract a notification delivery backend must implement.
#[cfg_attr(test, mockall::automock)]
pub trait NotificationGateway {
    /// Whether a delivery endpoint exists at all in the current session.
    fn is_available(&self) -> bool;

    fn check_permission(&mut self) -> Result<Permission>;

    fn request_permission(&mut self) -> Result<Permission>;

    fn schedule_recurring(&mut self, title: &str, body: &str, hour: u32, minute: u32)
        -> Result<()>;
}

/// Shows one notification right now. The recurring daemon drives this once a day.
pub trait ReminderSink: Send {
    fn notify(&mut self, title: &str, body: &str) -> Result<()>;
}

/// Makes sure exactly one recurring reminder exists. A durable flag records success and
/// short-circuits every later attempt for the lifetime of the install; denial and absence of a
/// delivery endpoint leave the flag untouched so the next launch tries again.
pub struct ReminderScheduler<S> {
    flags: S,
    gateway: Box<dyn NotificationGateway>,
}

impl<S: KeyValueStore> ReminderScheduler<S> {
    pub fn new(flags: S, gateway: Box<dyn NotificationGateway>) -> Self {
        Self { flags, gateway }
    }

    pub async fn ensure_daily_reminder(&mut self, hour: u32, minute: u32) -> Result<ScheduleResult> {
        if self.already_scheduled().await {
            return Ok(ScheduleResult::AlreadyScheduled);
        }

        if !self.gateway.is_available() {
            info!("No notification endpoint in this session, skipping reminder setup");
            return Ok(ScheduleResult::Skipped);
        }

        let permission = match self.gateway.check_permission()? {
            Permission::Granted => Permission::Granted,
            // At most one request per invocation. Denial is retried on the next launch, success
            // never is.
            Permission::Denied => self.gateway.request_permission()?,
        };
        if permission == Permission::Denied {
            info!("Notification permission denied, reminder stays unscheduled");
            return Ok(ScheduleResult::PermissionDenied);
        }

        self.gateway
            .schedule_recurring(REMINDER_TITLE, REMINDER_BODY, hour, minute)?;
        self.mark_scheduled().await;
        Ok(ScheduleResult::Scheduled)
    }

    async fn already_scheduled(&self) -> bool {
        match self.flags.get(REMINDER_FLAG_KEY).await {
            Ok(v) => v.as_deref() == Some(FLAG_SET),
            Err(e) => {
                warn!("Failed to read the reminder flag {e:?}");
                false
            }
        }
    }

    async fn mark_scheduled(&self) {
        if let Err(e) = self.flags.set(REMINDER_FLAG_KEY, FLAG_SET.into()).await {
            warn!("Failed to persist the reminder flag {e:?}");
        }
    }
}
