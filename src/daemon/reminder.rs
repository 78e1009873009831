use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local};
use now::DateTimeNow;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    notify::{ReminderSink, REMINDER_BODY, REMINDER_TITLE},
    tracker::day_key::DayKey,
    utils::clock::Clock,
};

/// The tick only needs to be fine enough to catch a minute-precision fire time and the midnight
/// rollover.
const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Emulates a recurring local alarm: wakes once a minute, recomputes the current day and pushes
/// the reminder through the sink when the fire time is crossed. At most one delivery per
/// calendar day, and a delivery failure is not retried until the next day.
pub struct ReminderModule {
    sink: Box<dyn ReminderSink>,
    shutdown: CancellationToken,
    hour: u32,
    minute: u32,
    time_provider: Box<dyn Clock>,
}

impl ReminderModule {
    pub fn new(
        sink: Box<dyn ReminderSink>,
        shutdown: CancellationToken,
        hour: u32,
        minute: u32,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            sink,
            shutdown,
            hour,
            minute,
            time_provider,
        }
    }

    fn fire_moment(&self, now: DateTime<Local>) -> DateTime<Local> {
        now.beginning_of_day()
            + chrono::Duration::hours(self.hour as i64)
            + chrono::Duration::minutes(self.minute as i64)
    }

    /// Executes the reminder event loop.
    pub async fn run(mut self) -> Result<()> {
        let start = self.time_provider.time();
        // An alarm whose time already passed today belongs to tomorrow. Without this a daemon
        // started in the afternoon would fire immediately.
        let mut last_fired = if start >= self.fire_moment(start) {
            Some(DayKey::for_instant(start))
        } else {
            None
        };

        let mut tick_point = self.time_provider.instant();
        loop {
            let now = self.time_provider.time();
            let today = DayKey::for_instant(now);

            if last_fired != Some(today) && now >= self.fire_moment(now) {
                match self.sink.notify(REMINDER_TITLE, REMINDER_BODY) {
                    Ok(()) => info!("Reminder delivered for {today}"),
                    Err(e) => error!("Failed to deliver reminder for {today} {e:?}"),
                }
                last_fired = Some(today);
            }

            tick_point += TICK_INTERVAL;
            tokio::select! {
                // Cancelation means we stop execution of the event loop.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(tick_point) => ()
            }
        }
    }
}

#[cfg(test)]
mod reminder_tests {
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use crate::{notify::ReminderSink, utils::clock::Clock, utils::logging::TEST_LOGGING};

    use super::ReminderModule;

    #[derive(Clone)]
    struct TestClock {
        start_time: DateTime<Local>,
        reference: Instant,
    }

    impl TestClock {
        fn at(hour: u32, minute: u32) -> Self {
            let date = NaiveDate::from_ymd_opt(2018, 7, 4).unwrap();
            let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
            Self {
                start_time: Local
                    .from_local_datetime(&NaiveDateTime::new(date, time))
                    .unwrap(),
                reference: Instant::now(),
            }
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            self.start_time + self.reference.elapsed()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    #[derive(Clone, Default)]
    struct CountingSink {
        deliveries: Arc<Mutex<u32>>,
    }

    impl CountingSink {
        fn count(&self) -> u32 {
            *self.deliveries.lock().unwrap()
        }
    }

    impl ReminderSink for CountingSink {
        fn notify(&mut self, _title: &str, _body: &str) -> Result<()> {
            *self.deliveries.lock().unwrap() += 1;
            Ok(())
        }
    }

    async fn run_for(clock: TestClock, simulated: Duration) -> Result<CountingSink> {
        let sink = CountingSink::default();
        let shutdown = CancellationToken::new();
        let module = ReminderModule::new(
            Box::new(sink.clone()),
            shutdown.clone(),
            9,
            0,
            Box::new(clock),
        );

        let (_, run_result) = tokio::join!(
            async {
                tokio::time::sleep(simulated).await;
                shutdown.cancel()
            },
            module.run(),
        );
        run_result?;
        Ok(sink)
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_when_crossing_fire_time() -> Result<()> {
        *TEST_LOGGING;
        let sink = run_for(TestClock::at(8, 58), Duration::from_secs(60 * 60)).await?;
        assert_eq!(sink.count(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_start_waits_for_tomorrow() -> Result<()> {
        // Started at 15:00, the 09:00 alarm belongs to the next day.
        let sink = run_for(TestClock::at(15, 0), Duration::from_secs(60 * 60 * 6)).await?;
        assert_eq!(sink.count(), 0);

        let sink = run_for(TestClock::at(15, 0), Duration::from_secs(60 * 60 * 20)).await?;
        assert_eq!(sink.count(), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_every_day_across_midnight() -> Result<()> {
        let sink = run_for(TestClock::at(8, 58), Duration::from_secs(60 * 60 * 24 * 3)).await?;
        assert_eq!(sink.count(), 3);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_the_loop() -> Result<()> {
        let sink = run_for(TestClock::at(12, 0), Duration::from_secs(90)).await?;
        assert_eq!(sink.count(), 0);
        Ok(())
    }
}
