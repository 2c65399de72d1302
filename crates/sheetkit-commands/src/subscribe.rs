//! Read-hook subscriptions over a command group.
//!
//! A [`CommandListSubscription`] keeps a view layer (a toolbar, a menu, a
//! command palette) supplied with the current resolution of a fixed key
//! list: the list handler fires once at subscription time and again after
//! every structural notification on the group, re-resolving each key with
//! active-path resolution. With property tracking enabled it also relays
//! the registry's key-indexed property signals, so metadata updates reach
//! the view synchronously. Dropping the subscription disconnects
//! everything.

use std::fmt;
use std::sync::Arc;

use sheetkit_core::logging::targets;
use sheetkit_core::{ConnectionId, Signal};

use crate::command::Command;
use crate::error::SubscribeError;
use crate::group::{CommandChange, CommandGroup, GroupEvent};

/// The resolved view of a subscription's key list, aligned with the keys.
pub type ResolvedCommands<S = (), C = ()> = Vec<Option<Arc<Command<S, C>>>>;

type ListHandler<S, C> = Arc<dyn Fn(&ResolvedCommands<S, C>) + Send + Sync>;
type PropertyHandler = Arc<dyn Fn(&CommandChange) + Send + Sync>;

/// What a subscription should deliver.
pub struct SubscribeOptions<S = (), C = ()> {
    on_list: ListHandler<S, C>,
    on_property: Option<PropertyHandler>,
    track_properties: bool,
}

impl<S, C> SubscribeOptions<S, C> {
    /// Options delivering list re-resolutions to the given handler.
    pub fn new<F>(on_list: F) -> Self
    where
        F: Fn(&ResolvedCommands<S, C>) + Send + Sync + 'static,
    {
        Self {
            on_list: Arc::new(on_list),
            on_property: None,
            track_properties: false,
        }
    }

    /// Request property tracking.
    ///
    /// Requires a property handler; [`CommandListSubscription::subscribe`]
    /// rejects the combination of this flag and no handler.
    pub fn track_properties(mut self, track: bool) -> Self {
        self.track_properties = track;
        self
    }

    /// Set the handler property changes are delivered to.
    pub fn on_property<F>(mut self, on_property: F) -> Self
    where
        F: Fn(&CommandChange) + Send + Sync + 'static,
    {
        self.on_property = Some(Arc::new(on_property));
        self
    }
}

impl<S, C> fmt::Debug for SubscribeOptions<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeOptions")
            .field("track_properties", &self.track_properties)
            .field("has_property_handler", &self.on_property.is_some())
            .finish()
    }
}

/// A live subscription to a group's resolution of a key list.
///
/// Keep the value alive for as long as deliveries are wanted; dropping it
/// disconnects the structural listener and every property relay.
pub struct CommandListSubscription<S = (), C = ()> {
    group: CommandGroup<S, C>,
    keys: Vec<String>,
    structural: Option<(Arc<Signal<GroupEvent>>, ConnectionId)>,
    properties: Vec<(Arc<Signal<CommandChange>>, ConnectionId)>,
}

impl<S, C> CommandListSubscription<S, C>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// Subscribe to a group's resolution of `keys`.
    ///
    /// The list handler fires once immediately with the current
    /// resolution, then again after each structural notification on the
    /// group (delivered on queue drain). With
    /// [`track_properties`](SubscribeOptions::track_properties) set, each
    /// key's registry property signal is relayed to the property handler;
    /// requesting tracking without a handler is a contract violation
    /// rejected here.
    pub fn subscribe(
        group: &CommandGroup<S, C>,
        keys: Vec<String>,
        options: SubscribeOptions<S, C>,
    ) -> Result<Self, SubscribeError> {
        if options.track_properties && options.on_property.is_none() {
            return Err(SubscribeError::MissingPropertyHandler);
        }

        let on_list = options.on_list;
        on_list(&Self::resolve(group, &keys));

        let structural = group.changed_signal().map(|signal| {
            let group = group.clone();
            let keys = keys.clone();
            let on_list = Arc::clone(&on_list);
            let id = signal.connect(move |_event: &GroupEvent| {
                on_list(&Self::resolve(&group, &keys));
            });
            (signal, id)
        });

        let mut properties = Vec::new();
        if options.track_properties {
            // Checked above.
            if let Some(on_property) = options.on_property {
                for key in &keys {
                    let signal = group.registry().command_changes(key);
                    let on_property = Arc::clone(&on_property);
                    let id = signal.connect(move |change: &CommandChange| {
                        on_property(change);
                    });
                    properties.push((signal, id));
                }
            }
        }

        tracing::debug!(
            target: targets::SUBSCRIBE,
            keys = keys.len(),
            track_properties = options.track_properties,
            "command list subscription installed"
        );

        Ok(Self {
            group: group.clone(),
            keys,
            structural,
            properties,
        })
    }

    /// The subscribed key list.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// The current resolution of the key list.
    pub fn commands(&self) -> ResolvedCommands<S, C> {
        Self::resolve(&self.group, &self.keys)
    }

    fn resolve(group: &CommandGroup<S, C>, keys: &[String]) -> ResolvedCommands<S, C> {
        keys.iter().map(|key| group.get_command(key)).collect()
    }
}

impl<S, C> Drop for CommandListSubscription<S, C> {
    fn drop(&mut self) {
        if let Some((signal, id)) = self.structural.take() {
            signal.disconnect(id);
        }
        for (signal, id) in self.properties.drain(..) {
            signal.disconnect(id);
        }
    }
}

impl<S, C> fmt::Debug for CommandListSubscription<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandListSubscription")
            .field("keys", &self.keys)
            .field("track_properties", &!self.properties.is_empty())
            .finish()
    }
}

static_assertions::assert_impl_all!(CommandListSubscription: Send, Sync);
