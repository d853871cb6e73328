//! # Spillwatch Feed Aggregator
//!
//! Bounded live-feed aggregation over the upstream AIS WebSocket stream.
//! One invocation opens its own connection, subscribes with the caller's
//! spatial/identity filter, collects position reports until the duration
//! budget elapses or the stream ends, and returns or streams the result.
//!
//! No state survives between invocations and invocations never share a
//! connection, so concurrent callers need no coordination.

pub mod aggregator;
pub mod error;

pub use aggregator::{collect, stream, FeedEvent};
pub use error::{FeedError, Result};
