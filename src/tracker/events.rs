use std::sync::Arc;

/// Notifications the controller emits whenever tracked state changes. The presentation side
/// consumes these to re-render, the core never calls into rendering directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// An item's completion state changed for the current day.
    ItemUpdated {
        id: Arc<str>,
        name: Arc<str>,
        streak: u32,
    },
    /// A completion was recorded. Rendered as the transient celebration.
    Celebration { name: Arc<str> },
    /// The streak crossed the milestone threshold with this completion.
    MilestoneReached { name: Arc<str>, streak: u32 },
}
