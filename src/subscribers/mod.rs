//! # Event subscribers for the appvisor runtime.
//!
//! This module provides the [`Subscribe`] trait, the [`SubscriberSet`] fan-out
//! and built-in implementations for handling runtime events broadcast through
//! the [`Bus`](crate::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Runner / Dispatcher / ValueStore ── publish(Event) ──► Bus ──► subscriber_listener
//!                                                                        │
//!                                                                   SubscriberSet::emit
//!                                                                        │
//!                                                            ┌───────────┼───────────┐
//!                                                            ▼           ▼           ▼
//!                                                        LogWriter    Metrics     Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub(crate) use set::panic_info;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
