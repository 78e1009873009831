//! State and day arithmetic for tracked items. Everything here is independent of how state is
//! rendered or where it is stored.

pub mod controller;
pub mod day_key;
pub mod events;
pub mod items;
pub mod streak;
