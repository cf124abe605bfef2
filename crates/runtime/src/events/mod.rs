//! Topic-based event bus for runtime events.
//!
//! Every controller transition, read-model refresh and handle status change
//! is published here in addition to being traced, so front-ends and loggers
//! can follow a session without polling it.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{HandleEvent, ReadModelEvent, TxEvent};
