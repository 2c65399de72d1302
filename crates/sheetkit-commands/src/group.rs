//! Hierarchical command groups and the dispatch registry.
//!
//! Groups form a tree owned by a [`CommandRegistry`]: every node lives in a
//! slotmap arena at the root, and [`CommandGroup`] handles are cheap
//! (registry `Arc` + node key) and freely clonable. Each node carries its
//! own command map, canonical-shortcut map, child map, and a local index of
//! itself and all descendants, so group lookup is O(1) at any level.
//!
//! One node is globally *active* (falling back to the root when none is).
//! Command resolution walks from the active node up the ancestor chain, so
//! a focused subtree shadows its ancestors while inactive subtrees never
//! leak their content sideways.
//!
//! Structural notifications (child created or removed, commands added,
//! activation changed) are deferred through the registry's
//! [`DispatchQueue`] and delivered up the parent chain only when the host
//! calls [`CommandRegistry::run_pending`]. Property notifications relay
//! synchronously into the registry's key-indexed signals.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sheetkit_core::logging::targets;
use sheetkit_core::{ConnectionId, DispatchQueue, Signal};
use slotmap::{SlotMap, new_key_type};

use crate::command::{Command, ExecuteHook, PropertyDelta};
use crate::keyboard::{CommandTarget, KeyEvent};
use crate::keystroke::event_candidates;

new_key_type! {
    /// Stable arena key identifying a group node.
    pub struct GroupId;
}

/// How a registration conflict on an already-taken key is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Keep the existing registration and log a warning.
    #[default]
    Warn,
    /// Keep the existing registration silently.
    Keep,
    /// Overwrite the existing registration.
    Replace,
}

/// A structural change delivered (deferred) up the parent chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupEvent {
    /// A child group was created under `group_key`.
    ChildCreated { group_key: String },
    /// Commands were registered on the group named `group_key`.
    CommandsAdded { group_key: String, keys: Vec<String> },
    /// The group named `group_key` became the active node.
    ActivationChanged { group_key: String },
    /// The child group named `group_key` was detached.
    ChildRemoved { group_key: String },
}

/// A property change relayed from one command into the registry's
/// key-indexed signals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandChange {
    /// The key of the command that changed.
    pub key: String,
    /// Which fields changed.
    pub delta: PropertyDelta,
}

/// A registered command plus its property-relay connection.
struct CommandEntry<S, C> {
    command: Arc<Command<S, C>>,
    relay: ConnectionId,
}

/// One node of the group tree.
struct GroupNode<S, C> {
    group_key: String,
    target: Option<Arc<dyn CommandTarget>>,
    parent: Option<GroupId>,
    commands: HashMap<String, CommandEntry<S, C>>,
    /// Canonical shortcut string -> command key.
    shortcuts: HashMap<String, String>,
    /// Direct children, by group key.
    children: HashMap<String, GroupId>,
    /// This node and every descendant, by group key. The root's index is
    /// the global one.
    index: HashMap<String, GroupId>,
    /// Structural-change signal, fired deferred.
    changed: Arc<Signal<GroupEvent>>,
    /// Activation signal carrying the newly active group's key, fired
    /// deferred.
    activated: Arc<Signal<String>>,
}

/// Root-owned registry state.
struct RegistryState<S, C> {
    nodes: SlotMap<GroupId, GroupNode<S, C>>,
    root: GroupId,
    focused: Option<GroupId>,
    /// Key-indexed property signals fed by the per-command relays.
    listeners: HashMap<String, Arc<Signal<CommandChange>>>,
}

impl<S, C> RegistryState<S, C> {
    /// Get or create the key-indexed property signal for a command key.
    fn listener(&mut self, key: &str) -> Arc<Signal<CommandChange>> {
        self.listeners
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Signal::new()))
            .clone()
    }

    /// Structural signals of `from` and every ancestor, nearest first.
    fn signals_up(&self, from: GroupId) -> Vec<Arc<Signal<GroupEvent>>> {
        let mut out = Vec::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            match self.nodes.get(id) {
                Some(node) => {
                    out.push(node.changed.clone());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        out
    }

    /// Activation signals of `from` and every ancestor, nearest first.
    fn activation_signals_up(&self, from: GroupId) -> Vec<Arc<Signal<String>>> {
        let mut out = Vec::new();
        let mut cursor = Some(from);
        while let Some(id) = cursor {
            match self.nodes.get(id) {
                Some(node) => {
                    out.push(node.activated.clone());
                    cursor = node.parent;
                }
                None => break,
            }
        }
        out
    }
}

/// The root-owned arena of group nodes plus the dispatch queue.
///
/// Create one per application shell via [`CommandRegistry::new`], then work
/// through [`CommandGroup`] handles starting at [`root`](Self::root).
/// Structural notifications accumulate in the queue until
/// [`run_pending`](Self::run_pending) drains it.
pub struct CommandRegistry<S = (), C = ()> {
    state: RwLock<RegistryState<S, C>>,
    queue: Arc<DispatchQueue>,
}

impl<S, C> CommandRegistry<S, C>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// Create a registry whose root group has the given key.
    pub fn new(root_key: impl Into<String>) -> Arc<Self> {
        let root_key = root_key.into();
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(GroupNode {
            group_key: root_key.clone(),
            target: None,
            parent: None,
            commands: HashMap::new(),
            shortcuts: HashMap::new(),
            children: HashMap::new(),
            index: HashMap::new(),
            changed: Arc::new(Signal::new()),
            activated: Arc::new(Signal::new()),
        });
        nodes[root].index.insert(root_key, root);

        Arc::new(Self {
            state: RwLock::new(RegistryState {
                nodes,
                root,
                focused: None,
                listeners: HashMap::new(),
            }),
            queue: Arc::new(DispatchQueue::new()),
        })
    }

    /// Handle to the root group.
    pub fn root(self: &Arc<Self>) -> CommandGroup<S, C> {
        let root = self.state.read().root;
        CommandGroup {
            registry: Arc::clone(self),
            id: root,
        }
    }

    /// Handle to the active group, falling back to the root.
    pub fn active(self: &Arc<Self>) -> CommandGroup<S, C> {
        let state = self.state.read();
        let id = state.focused.unwrap_or(state.root);
        CommandGroup {
            registry: Arc::clone(self),
            id,
        }
    }

    /// The dispatch queue deferred notifications go through.
    pub fn queue(&self) -> &Arc<DispatchQueue> {
        &self.queue
    }

    /// Drain the queue, delivering pending structural notifications.
    ///
    /// Returns the number of tasks run.
    pub fn run_pending(&self) -> usize {
        self.queue.drain()
    }

    /// The key-indexed property signal for a command key.
    ///
    /// Fires synchronously whenever a command registered anywhere in the
    /// tree under that key has an effective metadata update. The signal
    /// exists independently of any registration, so listeners may connect
    /// before the command appears.
    pub fn command_changes(&self, key: &str) -> Arc<Signal<CommandChange>> {
        self.state.write().listener(key)
    }
}

impl<S, C> fmt::Debug for CommandRegistry<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("CommandRegistry")
            .field("groups", &state.nodes.len())
            .field("focused", &state.focused)
            .finish_non_exhaustive()
    }
}

/// A cheap handle to one group node.
///
/// Handles stay valid across tree mutations; operations on a handle whose
/// node has been detached are no-ops returning "not found".
pub struct CommandGroup<S = (), C = ()> {
    registry: Arc<CommandRegistry<S, C>>,
    id: GroupId,
}

impl<S, C> Clone for CommandGroup<S, C> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            id: self.id,
        }
    }
}

impl<S, C> CommandGroup<S, C>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// The registry this group belongs to.
    pub fn registry(&self) -> &Arc<CommandRegistry<S, C>> {
        &self.registry
    }

    /// The arena key of this group's node.
    pub fn id(&self) -> GroupId {
        self.id
    }

    /// This group's key, or `None` when the node has been detached.
    pub fn key(&self) -> Option<String> {
        let state = self.registry.state.read();
        state.nodes.get(self.id).map(|node| node.group_key.clone())
    }

    /// Handle to the parent group, when one exists.
    pub fn parent(&self) -> Option<CommandGroup<S, C>> {
        let state = self.registry.state.read();
        let parent = state.nodes.get(self.id)?.parent?;
        Some(CommandGroup {
            registry: Arc::clone(&self.registry),
            id: parent,
        })
    }

    /// This group's visual target, if any.
    pub fn target(&self) -> Option<Arc<dyn CommandTarget>> {
        let state = self.registry.state.read();
        state.nodes.get(self.id)?.target.clone()
    }

    /// This group's structural-change signal.
    ///
    /// Fires (deferred, on queue drain) for changes on this group and on
    /// any descendant, since deferred notifications travel up the parent
    /// chain.
    pub fn changed_signal(&self) -> Option<Arc<Signal<GroupEvent>>> {
        let state = self.registry.state.read();
        state.nodes.get(self.id).map(|node| node.changed.clone())
    }

    /// This group's activation signal, carrying the active group's key.
    pub fn activated_signal(&self) -> Option<Arc<Signal<String>>> {
        let state = self.registry.state.read();
        state.nodes.get(self.id).map(|node| node.activated.clone())
    }

    /// Create (or reuse) a child group.
    ///
    /// The ancestor chain's local indices are consulted first: when a group
    /// with this key already exists anywhere the caller can see, the
    /// conflict policy decides — `Keep` and `Warn` return the existing
    /// handle (the latter logging), `Replace` detaches the existing node's
    /// subtree and creates a fresh node. Creation fires a deferred
    /// [`GroupEvent::ChildCreated`] up the parent chain.
    pub fn create_child_group(
        &self,
        target: Option<Arc<dyn CommandTarget>>,
        group_key: impl Into<String>,
        policy: ConflictPolicy,
    ) -> Option<CommandGroup<S, C>> {
        let group_key = group_key.into();

        // Existing-node scan along the caller's ancestor chain.
        let existing = {
            let state = self.registry.state.read();
            state.nodes.get(self.id)?;
            let mut found = None;
            let mut cursor = Some(self.id);
            while let Some(id) = cursor {
                let node = &state.nodes[id];
                if let Some(&hit) = node.index.get(&group_key) {
                    found = Some(hit);
                    break;
                }
                cursor = node.parent;
            }
            found
        };

        if let Some(existing) = existing {
            match policy {
                ConflictPolicy::Keep => {
                    return Some(CommandGroup {
                        registry: Arc::clone(&self.registry),
                        id: existing,
                    });
                }
                ConflictPolicy::Warn => {
                    tracing::warn!(
                        target: targets::GROUP,
                        group_key = %group_key,
                        "group key already registered, reusing existing group"
                    );
                    return Some(CommandGroup {
                        registry: Arc::clone(&self.registry),
                        id: existing,
                    });
                }
                ConflictPolicy::Replace => {
                    let handle = CommandGroup {
                        registry: Arc::clone(&self.registry),
                        id: existing,
                    };
                    handle.remove_from_parent();
                }
            }
        }

        let (signals, event, handle) = {
            let mut state = self.registry.state.write();
            state.nodes.get(self.id)?;

            let id = state.nodes.insert(GroupNode {
                group_key: group_key.clone(),
                target,
                parent: Some(self.id),
                commands: HashMap::new(),
                shortcuts: HashMap::new(),
                children: HashMap::new(),
                index: HashMap::new(),
                changed: Arc::new(Signal::new()),
                activated: Arc::new(Signal::new()),
            });
            state.nodes[id].index.insert(group_key.clone(), id);
            state.nodes[self.id]
                .children
                .insert(group_key.clone(), id);

            // Index the new key on every ancestor up to root.
            let mut cursor = Some(self.id);
            while let Some(ancestor) = cursor {
                let node = &mut state.nodes[ancestor];
                node.index.insert(group_key.clone(), id);
                cursor = node.parent;
            }

            tracing::debug!(
                target: targets::GROUP,
                group_key = %group_key,
                "child group created"
            );

            (
                state.signals_up(self.id),
                GroupEvent::ChildCreated {
                    group_key: group_key.clone(),
                },
                CommandGroup {
                    registry: Arc::clone(&self.registry),
                    id,
                },
            )
        };

        for signal in &signals {
            signal.emit_deferred(&self.registry.queue, event.clone());
        }
        Some(handle)
    }

    /// O(1) lookup of a group by key in this node's local index.
    ///
    /// Finds this group itself or any descendant; ancestors and siblings
    /// are not visible.
    pub fn get_group(&self, group_key: &str) -> Option<CommandGroup<S, C>> {
        let state = self.registry.state.read();
        let id = *state.nodes.get(self.id)?.index.get(group_key)?;
        Some(CommandGroup {
            registry: Arc::clone(&self.registry),
            id,
        })
    }

    /// Register commands on this group.
    ///
    /// Key conflicts resolve per the policy. Each registered command gets a
    /// property relay into the registry's key-indexed signals, installed
    /// once per registration (not per listener). Every declared shortcut is
    /// canonicalized and registered in the local shortcut map; collisions
    /// are logged and the newer registration wins, never rejected.
    /// Registration fires a deferred [`GroupEvent::CommandsAdded`] up the
    /// parent chain.
    pub fn add_commands(
        &self,
        commands: impl IntoIterator<Item = Arc<Command<S, C>>>,
        policy: ConflictPolicy,
    ) {
        // Resolve shortcut fields before taking the registry lock: computed
        // fields run user closures.
        let prepared: Vec<(Arc<Command<S, C>>, Vec<String>)> = commands
            .into_iter()
            .map(|command| {
                let canonicals = command
                    .shortcuts()
                    .iter()
                    .map(|keystroke| keystroke.canonical())
                    .collect();
                (command, canonicals)
            })
            .collect();

        let mut added = Vec::new();
        let (signals, group_key) = {
            let mut state = self.registry.state.write();
            if state.nodes.get(self.id).is_none() {
                return;
            }

            for (command, canonicals) in prepared {
                let key = command.key().to_string();
                if state.nodes[self.id].commands.contains_key(&key) {
                    match policy {
                        ConflictPolicy::Keep => continue,
                        ConflictPolicy::Warn => {
                            tracing::warn!(
                                target: targets::GROUP,
                                key = %key,
                                "command key already registered, keeping existing command"
                            );
                            continue;
                        }
                        ConflictPolicy::Replace => {
                            let node = &mut state.nodes[self.id];
                            if let Some(old) = node.commands.remove(&key) {
                                old.command.changed.disconnect(old.relay);
                            }
                            node.shortcuts.retain(|_, command_key| command_key != &key);
                        }
                    }
                }

                let listener = state.listener(&key);
                let relay_key = key.clone();
                let relay = command.changed.connect(move |delta: &PropertyDelta| {
                    listener.emit(CommandChange {
                        key: relay_key.clone(),
                        delta: *delta,
                    });
                });

                let node = &mut state.nodes[self.id];
                for canonical in canonicals {
                    if let Some(previous) =
                        node.shortcuts.insert(canonical.clone(), key.clone())
                    {
                        if previous != key {
                            tracing::warn!(
                                target: targets::GROUP,
                                shortcut = %canonical,
                                previous = %previous,
                                new = %key,
                                "shortcut collision, newer registration wins"
                            );
                        }
                    }
                }
                node.commands.insert(key.clone(), CommandEntry { command, relay });
                added.push(key);
            }

            if added.is_empty() {
                return;
            }
            tracing::debug!(
                target: targets::GROUP,
                count = added.len(),
                "commands registered"
            );
            (
                state.signals_up(self.id),
                state.nodes[self.id].group_key.clone(),
            )
        };

        let event = GroupEvent::CommandsAdded {
            group_key,
            keys: added,
        };
        for signal in &signals {
            signal.emit_deferred(&self.registry.queue, event.clone());
        }
    }

    /// Make this group the active node.
    ///
    /// No-op when it already is. Fires deferred structural and activation
    /// notifications up the parent chain.
    pub fn activate(&self) {
        self.activate_node(self.id);
    }

    /// Make a group from this node's local index the active node.
    ///
    /// Returns `false` when the key resolves to no visible group.
    pub fn activate_group(&self, group_key: &str) -> bool {
        let id = {
            let state = self.registry.state.read();
            match state
                .nodes
                .get(self.id)
                .and_then(|node| node.index.get(group_key))
            {
                Some(&id) => id,
                None => return false,
            }
        };
        self.activate_node(id);
        true
    }

    fn activate_node(&self, id: GroupId) {
        let (changed_signals, activation_signals, group_key) = {
            let mut state = self.registry.state.write();
            if state.nodes.get(id).is_none() {
                return;
            }
            if state.focused == Some(id) {
                return;
            }
            state.focused = Some(id);
            let group_key = state.nodes[id].group_key.clone();
            tracing::debug!(target: targets::GROUP, group_key = %group_key, "group activated");
            (
                state.signals_up(id),
                state.activation_signals_up(id),
                group_key,
            )
        };

        let event = GroupEvent::ActivationChanged {
            group_key: group_key.clone(),
        };
        for signal in &changed_signals {
            signal.emit_deferred(&self.registry.queue, event.clone());
        }
        for signal in &activation_signals {
            signal.emit_deferred(&self.registry.queue, group_key.clone());
        }
    }

    /// Handle to the active group, falling back to the root.
    pub fn get_active(&self) -> CommandGroup<S, C> {
        self.registry.active()
    }

    /// Resolve a command by key with active-path resolution.
    ///
    /// When the active node is this group or one of its descendants, the
    /// search starts at the active node; otherwise it starts here. From the
    /// start node, command maps are searched upward through the ancestors.
    /// An inactive subtree never sees another subtree's focused content.
    pub fn get_command(&self, key: &str) -> Option<Arc<Command<S, C>>> {
        let state = self.registry.state.read();
        state.nodes.get(self.id)?;

        let focused = state.focused.unwrap_or(state.root);
        let mut in_our_subtree = false;
        let mut cursor = Some(focused);
        while let Some(id) = cursor {
            if id == self.id {
                in_our_subtree = true;
                break;
            }
            cursor = state.nodes.get(id).and_then(|node| node.parent);
        }

        let start = if in_our_subtree { focused } else { self.id };
        let mut cursor = Some(start);
        while let Some(id) = cursor {
            let node = state.nodes.get(id)?;
            if let Some(entry) = node.commands.get(key) {
                return Some(entry.command.clone());
            }
            cursor = node.parent;
        }
        None
    }

    /// Resolve a command from a key event's shortcut candidates.
    ///
    /// At each level of the ancestor chain starting here, the first
    /// canonical candidate present in the local shortcut map selects a
    /// command; the match is accepted when the command is enabled and its
    /// effective target (its own, falling back to the owning group's)
    /// contains the event origin or there is no target. A rejected level
    /// falls through to the parent.
    ///
    /// When the whole chain fails, the rest of the tree is consulted: a
    /// registration in a group outside the chain matches only when its
    /// effective target contains the event origin, so a shortcut bound
    /// under a never-activated group still fires for events originating
    /// inside that group's region, while untargeted registrations stay
    /// invisible without activation.
    pub fn find_command_by_event(&self, event: &KeyEvent) -> Option<Arc<Command<S, C>>> {
        let candidates = event_candidates(event);
        if candidates.is_empty() {
            return None;
        }

        // Snapshot per-level hits inside the lock; run target/disabled
        // checks (user code) outside it.
        let mut chain: Vec<(Arc<Command<S, C>>, Option<Arc<dyn CommandTarget>>)> = Vec::new();
        let mut targeted: Vec<(Arc<Command<S, C>>, Option<Arc<dyn CommandTarget>>)> = Vec::new();
        {
            let state = self.registry.state.read();
            state.nodes.get(self.id)?;

            let mut chain_ids = Vec::new();
            let mut cursor = Some(self.id);
            while let Some(id) = cursor {
                let node = match state.nodes.get(id) {
                    Some(node) => node,
                    None => break,
                };
                chain_ids.push(id);
                let hit = candidates
                    .iter()
                    .find_map(|candidate| node.shortcuts.get(candidate));
                if let Some(command_key) = hit {
                    if let Some(entry) = node.commands.get(command_key) {
                        chain.push((entry.command.clone(), node.target.clone()));
                    }
                }
                cursor = node.parent;
            }

            // Off-chain groups, from the root down.
            let mut stack = vec![state.root];
            while let Some(id) = stack.pop() {
                let Some(node) = state.nodes.get(id) else {
                    continue;
                };
                stack.extend(node.children.values().copied());
                if chain_ids.contains(&id) {
                    continue;
                }
                let hit = candidates
                    .iter()
                    .find_map(|candidate| node.shortcuts.get(candidate));
                if let Some(command_key) = hit {
                    if let Some(entry) = node.commands.get(command_key) {
                        targeted.push((entry.command.clone(), node.target.clone()));
                    }
                }
            }
        }

        for (command, group_target) in chain {
            if command.disabled() {
                continue;
            }
            let effective = command.target().cloned().or(group_target);
            if let Some(target) = effective {
                if !target.contains(event.origin) {
                    continue;
                }
            }
            tracing::trace!(
                target: targets::GROUP,
                key = %command.key(),
                "shortcut resolved to command"
            );
            return Some(command);
        }

        for (command, group_target) in targeted {
            if command.disabled() {
                continue;
            }
            // Outside the chain a containing target is required, not
            // merely permitted.
            let Some(target) = command.target().cloned().or(group_target) else {
                continue;
            };
            if !target.contains(event.origin) {
                continue;
            }
            tracing::trace!(
                target: targets::GROUP,
                key = %command.key(),
                "shortcut resolved to command via containing target"
            );
            return Some(command);
        }
        None
    }

    /// Dispatch a key event through the active group.
    ///
    /// Already-consumed events are ignored. On a shortcut match the event
    /// is marked consumed *before* the command executes (its result is
    /// ignored), so the host suppresses its default action even when the
    /// command fails. Returns whether the event was handled.
    pub fn dispatch_to_focused_command(&self, event: &KeyEvent) -> bool {
        if event.is_consumed() {
            return false;
        }
        let active = self.get_active();
        let Some(command) = active.find_command_by_event(event) else {
            return false;
        };
        event.consume();
        tracing::debug!(
            target: targets::GROUP,
            key = %command.key(),
            origin = %event.origin,
            "dispatching key event"
        );
        let _ = command.execute(None, &ExecuteHook::new());
        true
    }

    /// Detach this group (and its whole subtree) from its parent.
    ///
    /// Removal cascades: every removed node's key is scrubbed from the
    /// surviving ancestors' indices, the removed commands' property relays
    /// are disconnected, and when the active node lay inside the removed
    /// subtree the focus is re-homed to the nearest surviving ancestor.
    /// Fires a deferred [`GroupEvent::ChildRemoved`] up the surviving
    /// chain. Returns `false` on the root or on an already-detached node.
    pub fn remove_from_parent(&self) -> bool {
        let (signals, event) = {
            let mut state = self.registry.state.write();
            let Some(node) = state.nodes.get(self.id) else {
                return false;
            };
            let Some(parent) = node.parent else {
                return false;
            };
            let group_key = node.group_key.clone();

            // Collect the subtree, breadth-first.
            let mut subtree = vec![self.id];
            let mut next = 0;
            while next < subtree.len() {
                let children: Vec<GroupId> =
                    state.nodes[subtree[next]].children.values().copied().collect();
                subtree.extend(children);
                next += 1;
            }

            let removed_keys: Vec<String> = subtree
                .iter()
                .map(|&id| state.nodes[id].group_key.clone())
                .collect();

            // Scrub the subtree's keys from every surviving ancestor's
            // index; only entries that point into the subtree are removed,
            // so an unrelated group reusing a key elsewhere survives.
            let mut cursor = Some(parent);
            while let Some(ancestor) = cursor {
                let node = &mut state.nodes[ancestor];
                for key in &removed_keys {
                    if node.index.get(key).is_some_and(|id| subtree.contains(id)) {
                        node.index.remove(key);
                    }
                }
                cursor = node.parent;
            }

            state.nodes[parent].children.remove(&group_key);

            if state.focused.is_some_and(|focused| subtree.contains(&focused)) {
                state.focused = Some(parent);
                tracing::debug!(
                    target: targets::GROUP,
                    "active group removed, focus re-homed to parent"
                );
            }

            for id in subtree {
                if let Some(node) = state.nodes.remove(id) {
                    for entry in node.commands.into_values() {
                        entry.command.changed.disconnect(entry.relay);
                    }
                }
            }

            tracing::debug!(target: targets::GROUP, group_key = %group_key, "group removed");
            (
                state.signals_up(parent),
                GroupEvent::ChildRemoved { group_key },
            )
        };

        for signal in &signals {
            signal.emit_deferred(&self.registry.queue, event.clone());
        }
        true
    }

    /// Flatten this group's commands and every descendant's, depth-first,
    /// each paired with its owning group's key. Ancestors are excluded.
    pub fn get_all_commands(&self) -> Vec<(String, Arc<Command<S, C>>)> {
        let state = self.registry.state.read();
        let mut out = Vec::new();
        let mut stack = vec![self.id];
        while let Some(id) = stack.pop() {
            let Some(node) = state.nodes.get(id) else {
                continue;
            };
            for entry in node.commands.values() {
                out.push((node.group_key.clone(), entry.command.clone()));
            }
            stack.extend(node.children.values().copied());
        }
        out
    }
}

impl<S, C> fmt::Debug for CommandGroup<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandGroup").field("id", &self.id).finish()
    }
}

static_assertions::assert_impl_all!(CommandRegistry: Send, Sync);
static_assertions::assert_impl_all!(CommandGroup: Send, Sync);
