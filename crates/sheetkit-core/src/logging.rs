//! Logging facilities for Sheetkit.
//!
//! Sheetkit uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in the host application:
//!
//! ```ignore
//! tracing_subscriber::fmt::init();
//! ```
//!
//! The [`targets`] module names the per-subsystem targets so hosts can
//! filter with `tracing` directives, e.g.
//! `RUST_LOG=sheetkit_commands::group=debug`.

/// Target names for log filtering.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "sheetkit_core::signal";
    /// Dispatch queue target.
    pub const QUEUE: &str = "sheetkit_core::queue";
    /// Command target.
    pub const COMMAND: &str = "sheetkit_commands::command";
    /// Group registry and keyboard dispatch target.
    pub const GROUP: &str = "sheetkit_commands::group";
    /// Subscription adapter target.
    pub const SUBSCRIBE: &str = "sheetkit_commands::subscribe";
}
