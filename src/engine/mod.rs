//! Mission progress engine: pure functions over in-memory mission values.
//!
//! Nothing in here touches the store, the clock or the notifier; callers
//! pass "now" and a [`calendar::Calendar`] explicitly.

pub mod calendar;
pub mod progress;
pub mod schedule;
pub mod streak;
pub mod toggle;
