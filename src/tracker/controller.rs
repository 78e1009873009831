use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, warn};

use crate::{
    storage::{item_store::ItemStore, kv::KeyValueStore},
    utils::clock::Clock,
};

use super::{day_key::DayKey, events::StateEvent, items::TrackedItem, streak::streak_for};

/// Streak length that triggers the one-time celebration toast. Fired only on the completion that
/// crosses it, never again while the streak sits at or above it.
pub const MILESTONE_STREAK: u32 = 7;

/// Outcome of a single mark-complete call. On an idempotent repeat `streak_before` equals
/// `streak_after` and no milestone is reported.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Completion {
    pub name: Arc<str>,
    pub streak_before: u32,
    pub streak_after: u32,
    pub milestone_reached: bool,
}

/// Snapshot of one item for rendering.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ItemStatus {
    pub id: Arc<str>,
    pub name: Arc<str>,
    pub done_today: bool,
    pub streak: u32,
}

/// Owns the in-memory item collection and coordinates mutation, persistence and state change
/// events. All mutation goes through [mark_complete](Self::mark_complete); the in-memory update
/// is synchronous while the durable write runs fire-and-forget on the runtime, so a second tap
/// arriving mid-write still sees the latest intent.
pub struct CompletionController<S: KeyValueStore + Send + Sync + 'static> {
    items: Vec<TrackedItem>,
    store: Arc<ItemStore<S>>,
    events: mpsc::Sender<StateEvent>,
    clock: Box<dyn Clock>,
    pending_saves: Vec<JoinHandle<()>>,
}

impl<S: KeyValueStore + Send + Sync + 'static> CompletionController<S> {
    /// Restores the collection from storage, or seeds the defaults when there is nothing usable
    /// to restore.
    pub async fn restore(
        store: ItemStore<S>,
        events: mpsc::Sender<StateEvent>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let items = store.load_or_default().await;
        Self {
            items,
            store: Arc::new(store),
            events,
            clock,
            pending_saves: Vec::new(),
        }
    }

    pub fn today(&self) -> DayKey {
        DayKey::for_instant(self.clock.time())
    }

    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    pub fn status(&self) -> Vec<ItemStatus> {
        let today = self.today();
        self.items
            .iter()
            .map(|item| ItemStatus {
                id: item.id.clone(),
                name: item.name.clone(),
                done_today: item.done_on(today),
                streak: streak_for(&item.completed_days, today),
            })
            .collect()
    }

    /// Marks an item as completed for the current day. Repeating the call on the same day is a
    /// no-op: the streak doesn't move and no celebration fires again.
    pub async fn mark_complete(&mut self, id: &str) -> Result<Completion> {
        let today = self.today();
        let item = self
            .items
            .iter_mut()
            .find(|v| &*v.id == id)
            .ok_or_else(|| anyhow!("No tracked item with id {id}"))?;

        if item.done_on(today) {
            debug!("{id} already completed on {today}");
            let streak = streak_for(&item.completed_days, today);
            return Ok(Completion {
                name: item.name.clone(),
                streak_before: streak,
                streak_after: streak,
                milestone_reached: false,
            });
        }

        // The run that today extends ends yesterday, so that's where the before-count starts.
        let streak_before = streak_for(&item.completed_days, today.previous());
        item.completed_days.insert(today);
        // Only today changed, so the run grows by exactly one.
        let streak_after = streak_before + 1;
        let milestone_reached = streak_after == MILESTONE_STREAK;

        let item_id = item.id.clone();
        let name = item.name.clone();

        self.persist();

        self.emit(StateEvent::ItemUpdated {
            id: item_id,
            name: name.clone(),
            streak: streak_after,
        })
        .await;
        self.emit(StateEvent::Celebration { name: name.clone() }).await;
        if milestone_reached {
            self.emit(StateEvent::MilestoneReached {
                name: name.clone(),
                streak: streak_after,
            })
            .await;
        }

        Ok(Completion {
            name,
            streak_before,
            streak_after,
            milestone_reached,
        })
    }

    /// Issues a durable write of the whole collection without waiting for it. A failed write is
    /// logged and swallowed, the in-memory state stays authoritative for the session.
    fn persist(&mut self) {
        let raw = match ItemStore::<S>::encode(&self.items) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to serialize tracked items {e:?}");
                return;
            }
        };
        let store = self.store.clone();
        self.pending_saves.push(tokio::spawn(async move {
            if let Err(e) = store.save_encoded(raw).await {
                warn!("Failed to persist tracked items {e:?}");
            }
        }));
    }

    async fn emit(&self, event: StateEvent) {
        if let Err(e) = self.events.send(event).await {
            debug!("Nobody is listening for state events {e:?}");
        }
    }

    /// Waits for writes still in flight. Called once before process exit so a short-lived cli
    /// invocation doesn't drop a pending save on the floor.
    pub async fn finalize(&mut self) {
        for save in self.pending_saves.drain(..) {
            let _ = save.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
    use tempfile::tempdir;
    use tokio::{sync::mpsc, time::Instant};

    use crate::{
        storage::{item_store::ItemStore, kv::FileKvStore},
        tracker::{events::StateEvent, streak::streak_for},
        utils::clock::Clock,
    };

    use super::{CompletionController, MILESTONE_STREAK};

    const TEST_START_DATE: NaiveDateTime = NaiveDateTime::new(
        NaiveDate::from_ymd_opt(2018, 7, 4).unwrap(),
        NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
    );

    #[derive(Clone)]
    struct TestClock {
        now: Arc<Mutex<DateTime<Local>>>,
    }

    impl TestClock {
        fn at(moment: NaiveDateTime) -> Self {
            Self {
                now: Arc::new(Mutex::new(Local.from_local_datetime(&moment).unwrap())),
            }
        }

        fn advance(&self, duration: Duration) {
            let mut now = self.now.lock().unwrap();
            *now += duration;
        }
    }

    #[async_trait]
    impl Clock for TestClock {
        fn time(&self) -> DateTime<Local> {
            *self.now.lock().unwrap()
        }

        fn instant(&self) -> Instant {
            Instant::now()
        }

        async fn sleep_until(&self, instant: tokio::time::Instant) {
            tokio::time::sleep_until(instant).await;
        }
    }

    struct TestSetup {
        controller: CompletionController<FileKvStore>,
        events: mpsc::Receiver<StateEvent>,
        clock: TestClock,
        _dir: tempfile::TempDir,
    }

    async fn controller_at(moment: NaiveDateTime) -> Result<TestSetup> {
        let dir = tempdir()?;
        let store = ItemStore::new(FileKvStore::new(dir.path().to_owned())?);
        // Production drains events after each single completion (see cli::complete), so a
        // 16-slot buffer is ample there. Tests that perform many completions against one
        // controller without draining need headroom to avoid back-pressure blocking emit().
        let (sender, receiver) = mpsc::channel(1024);
        let clock = TestClock::at(moment);
        let controller =
            CompletionController::restore(store, sender, Box::new(clock.clone())).await;
        Ok(TestSetup {
            controller,
            events: receiver,
            clock,
            _dir: dir,
        })
    }

    #[tokio::test]
    async fn test_first_completion_starts_a_streak() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        let completion = setup.controller.mark_complete("vitamin-d").await?;

        assert_eq!(completion.streak_before, 0);
        assert_eq!(completion.streak_after, 1);
        assert!(!completion.milestone_reached);
        Ok(())
    }

    #[tokio::test]
    async fn test_repeated_completion_is_idempotent() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        setup.controller.mark_complete("vitamin-d").await?;
        let items_after_first = setup.controller.items().to_vec();
        let repeat = setup.controller.mark_complete("vitamin-d").await?;

        assert_eq!(repeat.streak_before, repeat.streak_after);
        assert!(!repeat.milestone_reached);
        assert_eq!(setup.controller.items(), &items_after_first[..]);
        Ok(())
    }

    #[tokio::test]
    async fn test_completion_extends_streak_across_days() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        setup.controller.mark_complete("vitamin-d").await?;
        setup.clock.advance(Duration::days(1));
        let completion = setup.controller.mark_complete("vitamin-d").await?;

        assert_eq!(completion.streak_before, 1);
        assert_eq!(completion.streak_after, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_milestone_fires_on_seventh_consecutive_day() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        for day in 0..MILESTONE_STREAK {
            let completion = setup.controller.mark_complete("vitamin-d").await?;
            assert_eq!(completion.streak_after, day + 1);
            assert_eq!(
                completion.milestone_reached,
                completion.streak_after == MILESTONE_STREAK
            );
            setup.clock.advance(Duration::days(1));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_milestone_does_not_refire_past_seven() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        for _ in 0..MILESTONE_STREAK + 2 {
            let completion = setup.controller.mark_complete("vitamin-d").await?;
            if completion.streak_after > MILESTONE_STREAK {
                assert!(!completion.milestone_reached);
            }
            setup.clock.advance(Duration::days(1));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_item_is_rejected() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        assert!(setup.controller.mark_complete("creatine").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_completion_emits_celebration_events() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        setup.controller.mark_complete("vitamin-d").await?;

        let updated = setup.events.recv().await.unwrap();
        assert!(matches!(updated, StateEvent::ItemUpdated { streak: 1, .. }));
        let celebration = setup.events.recv().await.unwrap();
        assert!(matches!(celebration, StateEvent::Celebration { .. }));
        assert!(setup.events.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_repeat_completion_emits_nothing() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        setup.controller.mark_complete("vitamin-d").await?;
        while setup.events.try_recv().is_ok() {}

        setup.controller.mark_complete("vitamin-d").await?;
        assert!(setup.events.try_recv().is_err());
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_state_survives_restore() -> Result<()> {
        let dir = tempdir()?;
        let clock = TestClock::at(TEST_START_DATE);
        let (sender, _receiver) = mpsc::channel(16);

        let store = ItemStore::new(FileKvStore::new(dir.path().to_owned())?);
        let mut controller =
            CompletionController::restore(store, sender.clone(), Box::new(clock.clone())).await;
        controller.mark_complete("vitamin-d").await?;
        controller.mark_complete("omega-3").await?;
        controller.finalize().await;

        let store = ItemStore::new(FileKvStore::new(dir.path().to_owned())?);
        let restored = CompletionController::restore(store, sender, Box::new(clock)).await;

        let today = restored.today();
        let done = restored
            .items()
            .iter()
            .filter(|v| v.done_on(today))
            .count();
        assert_eq!(done, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_status_reflects_day_rollover() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        setup.controller.mark_complete("vitamin-d").await?;
        let status = setup.controller.status();
        let vitamin = status.iter().find(|v| &*v.id == "vitamin-d").unwrap();
        assert!(vitamin.done_today);
        assert_eq!(vitamin.streak, 1);

        setup.clock.advance(Duration::days(1));
        let status = setup.controller.status();
        let vitamin = status.iter().find(|v| &*v.id == "vitamin-d").unwrap();
        assert!(!vitamin.done_today);
        // Yesterday's run no longer reaches today.
        assert_eq!(vitamin.streak, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_six_day_run_reaches_milestone_today() -> Result<()> {
        let mut setup = controller_at(TEST_START_DATE).await?;

        // Seed six consecutive days ending yesterday directly into the collection.
        let today = setup.controller.today();
        {
            let item = setup
                .controller
                .items
                .iter_mut()
                .find(|v| &*v.id == "vitamin-d")
                .unwrap();
            let mut day = today.previous();
            for _ in 0..6 {
                item.completed_days.insert(day);
                day = day.previous();
            }
            assert_eq!(streak_for(&item.completed_days, today.previous()), 6);
        }

        let completion = setup.controller.mark_complete("vitamin-d").await?;

        assert_eq!(completion.streak_before, 6);
        assert_eq!(completion.streak_after, 7);
        assert!(completion.milestone_reached);
        Ok(())
    }
}
