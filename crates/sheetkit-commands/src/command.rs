//! Commands with dynamic metadata and hook-mediated execution.
//!
//! A [`Command`] is a named action: an immutable key, metadata fields that
//! may be literal or computed from an application context, an optional
//! visual target scoping its shortcuts, and an optional callback. Metadata
//! is mutated only through [`Command::update`], which computes a shallow
//! delta and notifies property listeners synchronously. Execution runs
//! through [`Command::execute`] under an [`ExecuteHook`]; failures are
//! contained there and surfaced through the `failed` signal, never
//! propagated to the dispatch pipeline.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use sheetkit_core::logging::targets;
use sheetkit_core::{ConnectionId, Signal};

use crate::dynamic::{ContextSource, DynField, field_changed};
use crate::error::CommandError;
use crate::keyboard::CommandTarget;
use crate::keystroke::Keystroke;

/// Payload handed to a command callback.
///
/// Commands are invoked from heterogeneous call sites (keyboard dispatch,
/// menus, scripting), so the payload is dynamically typed; callbacks
/// downcast to what they expect.
pub type CommandArgs = Option<Arc<dyn Any + Send + Sync>>;

/// The action a command performs.
///
/// `Ok(true)` means the action ran; `Ok(false)` declines silently (the
/// command decided not to act); `Err` reports a failure, which `execute`
/// contains and routes to error listeners.
pub type CommandCallback =
    Arc<dyn Fn(&CommandArgs) -> Result<bool, CommandError> + Send + Sync>;

/// Which metadata fields an [`update`](Command::update) changed.
///
/// Passed to property listeners. The default value is the empty delta,
/// used for the immediate fire of
/// [`add_property_listener`](Command::add_property_listener).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PropertyDelta {
    pub label: bool,
    pub scoped_labels: bool,
    pub description: bool,
    pub icon: bool,
    pub tags: bool,
    pub shortcuts: bool,
    pub disabled: bool,
    pub state: bool,
}

impl PropertyDelta {
    /// Check whether no field changed.
    pub fn is_empty(&self) -> bool {
        !(self.label
            || self.scoped_labels
            || self.description
            || self.icon
            || self.tags
            || self.shortcuts
            || self.disabled
            || self.state)
    }
}

/// A shallow metadata update.
///
/// Fields left as `None` are untouched. Build one with the chainable
/// setters and apply it with [`Command::update`]:
///
/// ```ignore
/// command.update(CommandUpdate::new().label("Paste Special").disabled(true));
/// ```
pub struct CommandUpdate<S = (), C = ()> {
    label: Option<DynField<String, C>>,
    scoped_labels: Option<DynField<HashMap<String, String>, C>>,
    description: Option<DynField<Option<String>, C>>,
    icon: Option<DynField<Option<String>, C>>,
    tags: Option<DynField<Vec<String>, C>>,
    shortcuts: Option<DynField<Vec<Keystroke>, C>>,
    disabled: Option<DynField<bool, C>>,
    state: Option<DynField<S, C>>,
}

impl<S, C> Default for CommandUpdate<S, C> {
    fn default() -> Self {
        Self {
            label: None,
            scoped_labels: None,
            description: None,
            icon: None,
            tags: None,
            shortcuts: None,
            disabled: None,
            state: None,
        }
    }
}

impl<S, C> CommandUpdate<S, C> {
    /// Create an empty update.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the label.
    pub fn label(mut self, label: impl Into<DynField<String, C>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Replace the scoped-label map.
    pub fn scoped_labels(mut self, labels: impl Into<DynField<HashMap<String, String>, C>>) -> Self {
        self.scoped_labels = Some(labels.into());
        self
    }

    /// Replace the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(DynField::Literal(Some(description.into())));
        self
    }

    /// Replace the description with a dynamic field.
    pub fn description_field(mut self, description: DynField<Option<String>, C>) -> Self {
        self.description = Some(description);
        self
    }

    /// Replace the icon.
    pub fn icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(DynField::Literal(Some(icon.into())));
        self
    }

    /// Replace the tag list.
    pub fn tags(mut self, tags: impl Into<DynField<Vec<String>, C>>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    /// Replace the shortcut list.
    pub fn shortcuts(mut self, shortcuts: impl Into<DynField<Vec<Keystroke>, C>>) -> Self {
        self.shortcuts = Some(shortcuts.into());
        self
    }

    /// Replace the disabled flag.
    pub fn disabled(mut self, disabled: impl Into<DynField<bool, C>>) -> Self {
        self.disabled = Some(disabled.into());
        self
    }

    /// Replace the application-defined state.
    pub fn state(mut self, state: impl Into<DynField<S, C>>) -> Self {
        self.state = Some(state.into());
        self
    }
}

impl<S, C> fmt::Debug for CommandUpdate<S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandUpdate")
            .field("label", &self.label)
            .field("disabled", &self.disabled)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

type BeforeFn = Box<dyn Fn(&CommandArgs) -> Result<bool, CommandError> + Send + Sync>;
type AfterFn = Box<dyn Fn(&CommandArgs) + Send + Sync>;
type ErrorFn = Box<dyn Fn(&CommandError) + Send + Sync>;

/// Per-invocation hooks threaded through [`Command::execute`].
///
/// The dispatcher (or any other call site) can veto execution with
/// `before`, observe success with `on_execute`, and observe contained
/// failures with `on_error`. All hooks are optional; the default hook is
/// inert.
#[derive(Default)]
pub struct ExecuteHook {
    before: Option<BeforeFn>,
    on_execute: Option<AfterFn>,
    on_error: Option<ErrorFn>,
}

impl ExecuteHook {
    /// Create an inert hook.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run before the callback; `Ok(false)` aborts execution silently.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandArgs) -> Result<bool, CommandError> + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    /// Run after the callback succeeds, before execute listeners.
    pub fn on_execute<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandArgs) + Send + Sync + 'static,
    {
        self.on_execute = Some(Box::new(f));
        self
    }

    /// Run when any step fails, before error listeners.
    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&CommandError) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for ExecuteHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteHook")
            .field("before", &self.before.is_some())
            .field("on_execute", &self.on_execute.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// Mutable command metadata, guarded by the command's lock.
struct CommandState<S, C> {
    label: DynField<String, C>,
    scoped_labels: DynField<HashMap<String, String>, C>,
    description: DynField<Option<String>, C>,
    icon: DynField<Option<String>, C>,
    tags: DynField<Vec<String>, C>,
    shortcuts: DynField<Vec<Keystroke>, C>,
    disabled: DynField<bool, C>,
    state: DynField<S, C>,
    callback: Option<CommandCallback>,
}

/// A named action with dynamic metadata.
///
/// `S` is the application-defined state payload carried in metadata; `C`
/// is the context type computed fields resolve against. Both default to
/// `()` for commands that need neither.
///
/// # Signals
///
/// - `changed` — fires synchronously with a [`PropertyDelta`] after each
///   effective [`update`](Command::update)
/// - `executed` — fires after the callback succeeds
/// - `failed` — fires when execution is aborted by an error
///
/// # Example
///
/// ```ignore
/// let copy = Command::<(), AppCtx>::new("edit.copy")
///     .with_label("Copy")
///     .with_shortcut("Ctrl+C".parse()?)
///     .with_callback(|_args| {
///         // ...
///         Ok(true)
///     });
/// ```
pub struct Command<S = (), C = ()> {
    key: String,
    target: Option<Arc<dyn CommandTarget>>,
    context: ContextSource<C>,
    inner: RwLock<CommandState<S, C>>,
    /// Emitted synchronously after each effective metadata update.
    pub changed: Signal<PropertyDelta>,
    /// Emitted after the callback succeeds.
    pub executed: Signal<CommandArgs>,
    /// Emitted when execution fails.
    pub failed: Signal<CommandError>,
}

impl<S, C> Command<S, C>
where
    S: Clone + PartialEq + Send + Sync + 'static,
    C: Send + Sync + 'static,
{
    /// Create a command with the given key and all-default metadata.
    ///
    /// The key is immutable for the life of the command.
    pub fn new(key: impl Into<String>) -> Self
    where
        S: Default,
        C: Default,
    {
        let key = key.into();
        Self {
            key: key.clone(),
            target: None,
            context: ContextSource::default(),
            inner: RwLock::new(CommandState {
                label: DynField::Literal(key),
                scoped_labels: DynField::Literal(HashMap::new()),
                description: DynField::Literal(None),
                icon: DynField::Literal(None),
                tags: DynField::Literal(Vec::new()),
                shortcuts: DynField::Literal(Vec::new()),
                disabled: DynField::Literal(false),
                state: DynField::Literal(S::default()),
                callback: None,
            }),
            changed: Signal::new(),
            executed: Signal::new(),
            failed: Signal::new(),
        }
    }

    /// Builder pattern for the label.
    pub fn with_label(self, label: impl Into<DynField<String, C>>) -> Self {
        self.inner.write().label = label.into();
        self
    }

    /// Builder pattern for one scoped label.
    ///
    /// Inserts into the current literal map; a computed map is replaced by
    /// a literal one holding only this entry.
    pub fn with_scoped_label(self, scope: impl Into<String>, label: impl Into<String>) -> Self {
        {
            let mut guard = self.inner.write();
            let mut map = guard
                .scoped_labels
                .as_literal()
                .cloned()
                .unwrap_or_default();
            map.insert(scope.into(), label.into());
            guard.scoped_labels = DynField::Literal(map);
        }
        self
    }

    /// Builder pattern for the description.
    pub fn with_description(self, description: impl Into<String>) -> Self {
        self.inner.write().description = DynField::Literal(Some(description.into()));
        self
    }

    /// Builder pattern for the icon.
    pub fn with_icon(self, icon: impl Into<String>) -> Self {
        self.inner.write().icon = DynField::Literal(Some(icon.into()));
        self
    }

    /// Builder pattern for the tag list.
    pub fn with_tags(self, tags: impl Into<DynField<Vec<String>, C>>) -> Self {
        self.inner.write().tags = tags.into();
        self
    }

    /// Builder pattern appending one shortcut.
    ///
    /// A computed shortcut list is replaced by a literal one holding only
    /// this keystroke.
    pub fn with_shortcut(self, keystroke: Keystroke) -> Self {
        {
            let mut guard = self.inner.write();
            let mut list = guard.shortcuts.as_literal().cloned().unwrap_or_default();
            list.push(keystroke);
            guard.shortcuts = DynField::Literal(list);
        }
        self
    }

    /// Builder pattern for the full shortcut list.
    pub fn with_shortcuts(self, shortcuts: impl Into<DynField<Vec<Keystroke>, C>>) -> Self {
        self.inner.write().shortcuts = shortcuts.into();
        self
    }

    /// Builder pattern for the disabled flag.
    pub fn with_disabled(self, disabled: impl Into<DynField<bool, C>>) -> Self {
        self.inner.write().disabled = disabled.into();
        self
    }

    /// Builder pattern for the application-defined state.
    pub fn with_state(self, state: impl Into<DynField<S, C>>) -> Self {
        self.inner.write().state = state.into();
        self
    }

    /// Builder pattern for the visual target.
    pub fn with_target(mut self, target: Arc<dyn CommandTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Builder pattern for the context source.
    pub fn with_context(mut self, context: ContextSource<C>) -> Self {
        self.context = context;
        self
    }

    /// Builder pattern for the callback.
    pub fn with_callback<F>(self, callback: F) -> Self
    where
        F: Fn(&CommandArgs) -> Result<bool, CommandError> + Send + Sync + 'static,
    {
        self.inner.write().callback = Some(Arc::new(callback));
        self
    }

    /// The immutable command key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The visual target scoping this command's shortcuts, if any.
    pub fn target(&self) -> Option<&Arc<dyn CommandTarget>> {
        self.target.as_ref()
    }

    /// The context source computed fields resolve against.
    pub fn context(&self) -> &ContextSource<C> {
        &self.context
    }

    /// Resolve the label.
    pub fn label(&self) -> String {
        let field = self.inner.read().label.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Resolve the label shown in the given scope, falling back to the
    /// default label when the scope has no entry.
    pub fn label_for_scope(&self, scope: &str) -> String {
        let (scoped, label) = {
            let guard = self.inner.read();
            (guard.scoped_labels.clone(), guard.label.clone())
        };
        let ctx = self.context.snapshot();
        scoped
            .resolve(&ctx)
            .get(scope)
            .cloned()
            .unwrap_or_else(|| label.resolve(&ctx))
    }

    /// Resolve the description.
    pub fn description(&self) -> Option<String> {
        let field = self.inner.read().description.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Resolve the icon.
    pub fn icon(&self) -> Option<String> {
        let field = self.inner.read().icon.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Resolve the tag list.
    pub fn tags(&self) -> Vec<String> {
        let field = self.inner.read().tags.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Resolve the shortcut list.
    pub fn shortcuts(&self) -> Vec<Keystroke> {
        let field = self.inner.read().shortcuts.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Resolve the application-defined state.
    pub fn state(&self) -> S {
        let field = self.inner.read().state.clone();
        field.resolve(&self.context.snapshot())
    }

    /// Check whether the command currently refuses execution.
    ///
    /// A command with no callback is always disabled, regardless of the
    /// explicit flag.
    pub fn disabled(&self) -> bool {
        let (field, has_callback) = {
            let guard = self.inner.read();
            (guard.disabled.clone(), guard.callback.is_some())
        };
        if !has_callback {
            return true;
        }
        field.resolve(&self.context.snapshot())
    }

    /// Check whether a callback is installed.
    pub fn has_callback(&self) -> bool {
        self.inner.read().callback.is_some()
    }

    /// Apply a shallow metadata update.
    ///
    /// Each provided field is compared against the current value: literal
    /// vs. literal compares by value, and a computed field on either side
    /// always counts as changed. Untouched and value-equal fields are left
    /// alone. When the resulting delta is non-empty, the `changed` signal
    /// fires synchronously before this method returns.
    pub fn update(&self, update: CommandUpdate<S, C>) -> &Self {
        let mut delta = PropertyDelta::default();
        {
            let mut guard = self.inner.write();
            if let Some(label) = update.label {
                if field_changed(&guard.label, &label) {
                    guard.label = label;
                    delta.label = true;
                }
            }
            if let Some(scoped_labels) = update.scoped_labels {
                if field_changed(&guard.scoped_labels, &scoped_labels) {
                    guard.scoped_labels = scoped_labels;
                    delta.scoped_labels = true;
                }
            }
            if let Some(description) = update.description {
                if field_changed(&guard.description, &description) {
                    guard.description = description;
                    delta.description = true;
                }
            }
            if let Some(icon) = update.icon {
                if field_changed(&guard.icon, &icon) {
                    guard.icon = icon;
                    delta.icon = true;
                }
            }
            if let Some(tags) = update.tags {
                if field_changed(&guard.tags, &tags) {
                    guard.tags = tags;
                    delta.tags = true;
                }
            }
            if let Some(shortcuts) = update.shortcuts {
                if field_changed(&guard.shortcuts, &shortcuts) {
                    guard.shortcuts = shortcuts;
                    delta.shortcuts = true;
                }
            }
            if let Some(disabled) = update.disabled {
                if field_changed(&guard.disabled, &disabled) {
                    guard.disabled = disabled;
                    delta.disabled = true;
                }
            }
            if let Some(state) = update.state {
                if field_changed(&guard.state, &state) {
                    guard.state = state;
                    delta.state = true;
                }
            }
        }

        if !delta.is_empty() {
            tracing::trace!(
                target: targets::COMMAND,
                key = %self.key,
                ?delta,
                "command metadata updated"
            );
            self.changed.emit(delta);
        }
        self
    }

    /// Replace the callback. Fires no notification.
    pub fn update_callback<F>(&self, callback: F) -> &Self
    where
        F: Fn(&CommandArgs) -> Result<bool, CommandError> + Send + Sync + 'static,
    {
        self.inner.write().callback = Some(Arc::new(callback));
        self
    }

    /// Remove the callback, leaving the command disabled.
    pub fn clear_callback(&self) -> &Self {
        self.inner.write().callback = None;
        self
    }

    /// Connect a property listener to the `changed` signal.
    ///
    /// With `fire_on_listen`, the listener is additionally invoked once,
    /// immediately, with the empty delta, so it can seed its initial view
    /// from the command's current metadata.
    pub fn add_property_listener<F>(&self, listener: F, fire_on_listen: bool) -> ConnectionId
    where
        F: Fn(&PropertyDelta) + Send + Sync + 'static,
    {
        if fire_on_listen {
            listener(&PropertyDelta::default());
        }
        self.changed.connect(listener)
    }

    /// Execute the command under the given hooks.
    ///
    /// Returns `false` without side effects when the command is disabled.
    /// Otherwise runs, in order: the `before` hook (an `Ok(false)` aborts
    /// silently), the callback (likewise), then on success the
    /// `on_execute` hook and the `executed` signal. Any `Err` from a step
    /// is routed to the `on_error` hook and the `failed` signal and
    /// converted to `false`; errors never reach the caller.
    pub fn execute(&self, args: CommandArgs, hook: &ExecuteHook) -> bool {
        if self.disabled() {
            tracing::trace!(target: targets::COMMAND, key = %self.key, "execute skipped, disabled");
            return false;
        }

        let callback = match self.inner.read().callback.clone() {
            Some(callback) => callback,
            None => return false,
        };

        if let Some(before) = &hook.before {
            match before(&args) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::trace!(target: targets::COMMAND, key = %self.key, "aborted by before hook");
                    return false;
                }
                Err(err) => return self.fail(err, hook),
            }
        }

        match callback(&args) {
            Ok(true) => {
                if let Some(on_execute) = &hook.on_execute {
                    on_execute(&args);
                }
                tracing::debug!(target: targets::COMMAND, key = %self.key, "command executed");
                self.executed.emit(args);
                true
            }
            Ok(false) => {
                tracing::trace!(target: targets::COMMAND, key = %self.key, "callback declined");
                false
            }
            Err(err) => self.fail(err, hook),
        }
    }

    fn fail(&self, err: CommandError, hook: &ExecuteHook) -> bool {
        tracing::warn!(
            target: targets::COMMAND,
            key = %self.key,
            error = %err,
            "command execution failed"
        );
        if let Some(on_error) = &hook.on_error {
            on_error(&err);
        }
        self.failed.emit(err);
        false
    }
}

impl<S, C> fmt::Debug for Command<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("key", &self.key)
            .field("has_target", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Command: Send, Sync);
