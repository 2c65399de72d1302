//! Core systems for Sheetkit.
//!
//! This crate provides the foundational components shared by the Sheetkit
//! command toolkit:
//!
//! - **Signal/Slot System**: Type-safe change notification
//! - **Dispatch Queue**: Explicit cooperative deferral of notification tasks
//! - **Logging**: `tracing` target names per subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use sheetkit_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Deferred Notification Example
//!
//! ```
//! use sheetkit_core::{DispatchQueue, Signal};
//!
//! let queue = DispatchQueue::new();
//! let changed = Signal::<String>::new();
//! changed.connect(|name| println!("group changed: {}", name));
//!
//! // Nothing runs yet; bursts of emissions coalesce until the drain.
//! changed.emit_deferred(&queue, "sheet".to_string());
//! changed.emit_deferred(&queue, "toolbar".to_string());
//! queue.drain();
//! ```

pub mod logging;
pub mod queue;
pub mod signal;

pub use queue::DispatchQueue;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
