//! Hierarchical command registry and keyboard shortcut dispatch.
//!
//! This crate provides the command layer of Sheetkit: named actions with
//! dynamic metadata, organized into a tree of groups with one globally
//! active node, resolved for keyboard dispatch through canonicalized
//! shortcut strings.
//!
//! # Architecture
//!
//! - [`Command`](command::Command): a keyed action whose metadata fields
//!   (label, description, shortcuts, disabled, …) are each either literal
//!   or computed from an application context
//! - [`CommandRegistry`](group::CommandRegistry) /
//!   [`CommandGroup`](group::CommandGroup): the group tree, activation,
//!   active-path command resolution, and key-event dispatch
//! - [`Keystroke`](keystroke::Keystroke): shortcut canonicalization, so
//!   `Ctrl+KeyC`, `Ctrl+c`, and `Cmd+C` all index identically
//! - [`CommandListSubscription`](subscribe::CommandListSubscription): the
//!   adapter feeding toolbars and menus
//!
//! Structural notifications are deferred through the registry's dispatch
//! queue and delivered by [`run_pending`](group::CommandRegistry::run_pending);
//! property notifications fire synchronously.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sheetkit_commands::{
//!     Command, CommandRegistry, ConflictPolicy, Key, KeyEvent, KeyboardModifiers,
//! };
//!
//! let registry: Arc<CommandRegistry> = CommandRegistry::new("root");
//! let root = registry.root();
//!
//! root.add_commands(
//!     [Arc::new(
//!         Command::new("edit.copy")
//!             .with_label("Copy")
//!             .with_shortcut("Ctrl+C".parse().unwrap())
//!             .with_callback(|_| Ok(true)),
//!     )],
//!     ConflictPolicy::default(),
//! );
//!
//! let event = KeyEvent::new(Key::C, KeyboardModifiers::CTRL).with_character('c');
//! assert!(root.dispatch_to_focused_command(&event));
//! ```

pub mod command;
pub mod dynamic;
pub mod error;
pub mod group;
pub mod keyboard;
pub mod keystroke;
pub mod subscribe;

pub use command::{Command, CommandArgs, CommandUpdate, ExecuteHook, PropertyDelta};
pub use dynamic::{ContextSource, DynField};
pub use error::{CommandError, SubscribeError};
pub use group::{
    CommandChange, CommandGroup, CommandRegistry, ConflictPolicy, GroupEvent, GroupId,
};
pub use keyboard::{CommandTarget, Key, KeyEvent, KeyboardModifiers, RegionId};
pub use keystroke::{Keystroke, KeystrokeParseError};
pub use subscribe::{CommandListSubscription, ResolvedCommands, SubscribeOptions};
