// src/notify/mod.rs

//! Progress notification delivery.
//!
//! A run reports progress through exactly one [`NotificationSink`], chosen
//! once when the run starts:
//!
//! - [`push`]: fire-and-forget notifications addressed by a progress token.
//!   Each send is a detached Tokio task; there is no backpressure and no
//!   ordering guarantee between sends.
//! - [`poll`]: a plain callback invoked inline on every dispatch, which also
//!   receives the log lines appended since the previous delivery.
//!
//! Delivery failures of either kind are logged at debug level and dropped.

pub mod payload;
pub mod poll;
pub mod push;
pub mod sink;

pub use payload::{ProgressNotification, ProgressToken, ProgressUpdate};
pub use poll::{PollCallback, PollUpdate};
pub use push::{JsonLinesTransport, PushChannel, PushTransport};
pub use sink::NotificationSink;
