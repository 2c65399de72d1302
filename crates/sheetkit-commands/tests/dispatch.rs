//! End-to-end dispatch scenarios: a spreadsheet-like shell with a grid
//! group, a modal dialog group, dynamic metadata, and list subscriptions.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use sheetkit_commands::{
    Command, CommandListSubscription, CommandRegistry, CommandTarget, CommandUpdate,
    ConflictPolicy, ContextSource, DynField, Key, KeyEvent, KeyboardModifiers, RegionId,
    SubscribeOptions,
};

const GRID: RegionId = RegionId(1);
const DIALOG: RegionId = RegionId(2);

fn init_logging() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

struct Region(RegionId);

impl CommandTarget for Region {
    fn contains(&self, region: RegionId) -> bool {
        region == self.0
    }

    fn focus(&self) {}
}

#[derive(Clone, Default)]
struct SheetContext {
    selected_rows: usize,
    read_only: bool,
}

type SharedContext = Arc<Mutex<SheetContext>>;

fn context_source(shared: &SharedContext) -> ContextSource<SheetContext> {
    let shared = shared.clone();
    ContextSource::new(move || shared.lock().clone())
}

fn counting_command(key: &str, shortcut: &str, hits: &Arc<AtomicUsize>) -> Arc<Command> {
    let hits = hits.clone();
    Arc::new(
        Command::new(key)
            .with_shortcut(shortcut.parse().unwrap())
            .with_callback(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }),
    )
}

#[test]
fn modal_dialog_shadows_grid_shortcuts() {
    init_logging();
    let registry: Arc<CommandRegistry> = CommandRegistry::new("app");
    let root = registry.root();
    let grid = root
        .create_child_group(Some(Arc::new(Region(GRID))), "grid", ConflictPolicy::default())
        .unwrap();
    let dialog = grid
        .create_child_group(Some(Arc::new(Region(DIALOG))), "dialog", ConflictPolicy::default())
        .unwrap();

    let grid_hits = Arc::new(AtomicUsize::new(0));
    let dialog_hits = Arc::new(AtomicUsize::new(0));
    grid.add_commands(
        [counting_command("confirm", "Enter", &grid_hits)],
        ConflictPolicy::default(),
    );
    dialog.add_commands(
        [counting_command("confirm", "Enter", &dialog_hits)],
        ConflictPolicy::default(),
    );

    grid.activate();
    let event = KeyEvent::new(Key::Enter, KeyboardModifiers::NONE).with_origin(GRID);
    assert!(root.dispatch_to_focused_command(&event));
    assert_eq!(grid_hits.load(Ordering::SeqCst), 1);

    // The dialog opens and takes focus; its registration shadows the grid's.
    dialog.activate();
    let event = KeyEvent::new(Key::Enter, KeyboardModifiers::NONE).with_origin(DIALOG);
    assert!(root.dispatch_to_focused_command(&event));
    assert_eq!(dialog_hits.load(Ordering::SeqCst), 1);
    assert_eq!(grid_hits.load(Ordering::SeqCst), 1);

    // The dialog closes; the grid's registration is visible again and the
    // focus survives the removal by re-homing.
    dialog.remove_from_parent();
    let event = KeyEvent::new(Key::Enter, KeyboardModifiers::NONE).with_origin(GRID);
    assert!(root.dispatch_to_focused_command(&event));
    assert_eq!(grid_hits.load(Ordering::SeqCst), 2);
}

#[test]
fn layout_variants_of_a_shortcut_all_dispatch() {
    init_logging();
    let registry: Arc<CommandRegistry> = CommandRegistry::new("app");
    let root = registry.root();
    let hits = Arc::new(AtomicUsize::new(0));
    root.add_commands(
        [counting_command("edit.copy", "Cmd+C", &hits)],
        ConflictPolicy::default(),
    );

    // Registered as Cmd+C; dispatched as Ctrl plus a physical code with a
    // divergent logical character.
    let event = KeyEvent::new(Key::C, KeyboardModifiers::CTRL).with_character('c');
    assert!(root.dispatch_to_focused_command(&event));

    let meta = KeyboardModifiers {
        meta: true,
        ..KeyboardModifiers::NONE
    };
    let event = KeyEvent::new(Key::Unknown(99), meta).with_character('C');
    assert!(root.dispatch_to_focused_command(&event));

    assert_eq!(hits.load(Ordering::SeqCst), 2);
}

#[test]
fn computed_metadata_tracks_application_state() {
    init_logging();
    let shared: SharedContext = Arc::default();
    let registry: Arc<CommandRegistry<(), SheetContext>> = CommandRegistry::new("app");
    let root = registry.root();

    let delete_rows: Arc<Command<(), SheetContext>> = Arc::new(
        Command::new("rows.delete")
            .with_context(context_source(&shared))
            .with_label(DynField::computed(|ctx: &SheetContext| {
                format!("Delete {} Rows", ctx.selected_rows)
            }))
            .with_disabled(DynField::computed(|ctx: &SheetContext| {
                ctx.read_only || ctx.selected_rows == 0
            }))
            .with_shortcut("Ctrl+-".parse().unwrap())
            .with_callback(|_| Ok(true)),
    );
    root.add_commands([delete_rows.clone()], ConflictPolicy::default());

    // Nothing selected: disabled, so dispatch falls through.
    let event = KeyEvent::new(Key::Minus, KeyboardModifiers::CTRL);
    assert!(!root.dispatch_to_focused_command(&event));

    shared.lock().selected_rows = 3;
    assert_eq!(delete_rows.label(), "Delete 3 Rows");
    let event = KeyEvent::new(Key::Minus, KeyboardModifiers::CTRL);
    assert!(root.dispatch_to_focused_command(&event));

    shared.lock().read_only = true;
    let event = KeyEvent::new(Key::Minus, KeyboardModifiers::CTRL);
    assert!(!root.dispatch_to_focused_command(&event));
}

#[test]
fn toolbar_subscription_sees_structure_and_properties() {
    init_logging();
    let registry: Arc<CommandRegistry> = CommandRegistry::new("app");
    let root = registry.root();
    root.add_commands(
        [Arc::new(
            Command::new("edit.copy")
                .with_label("Copy")
                .with_callback(|_| Ok(true)),
        )],
        ConflictPolicy::default(),
    );

    let lists = Arc::new(Mutex::new(Vec::new()));
    let labels = Arc::new(Mutex::new(Vec::new()));

    let lists_clone = lists.clone();
    let labels_clone = labels.clone();
    let root_for_handler = root.clone();
    let _subscription = CommandListSubscription::subscribe(
        &root,
        vec!["edit.copy".to_string(), "edit.paste".to_string()],
        SubscribeOptions::new(move |commands: &sheetkit_commands::ResolvedCommands| {
            lists_clone
                .lock()
                .push(commands.iter().filter(|c| c.is_some()).count());
        })
        .track_properties(true)
        .on_property(move |change| {
            if let Some(command) = root_for_handler.get_command(&change.key) {
                labels_clone.lock().push(command.label());
            }
        }),
    )
    .unwrap();

    assert_eq!(*lists.lock(), vec![1]);

    // Property update reaches the toolbar synchronously.
    root.get_command("edit.copy")
        .unwrap()
        .update(CommandUpdate::new().label("Copy Cells"));
    assert_eq!(*labels.lock(), vec!["Copy Cells".to_string()]);

    // Structural change arrives only on drain.
    root.add_commands(
        [Arc::new(
            Command::new("edit.paste")
                .with_label("Paste")
                .with_callback(|_| Ok(true)),
        )],
        ConflictPolicy::default(),
    );
    assert_eq!(*lists.lock(), vec![1]);
    registry.run_pending();
    assert_eq!(*lists.lock(), vec![1, 2]);
}

#[test]
fn failing_command_never_breaks_the_pipeline() {
    init_logging();
    let registry: Arc<CommandRegistry> = CommandRegistry::new("app");
    let root = registry.root();

    let failures = Arc::new(Mutex::new(Vec::new()));
    let failing = Arc::new(
        Command::new("sheet.recalculate")
            .with_shortcut("F9".parse().unwrap())
            .with_callback(|_| Err("circular reference".into())),
    );
    let failures_clone = failures.clone();
    failing.failed.connect(move |err| {
        failures_clone.lock().push(err.to_string());
    });
    root.add_commands([failing], ConflictPolicy::default());

    let hits = Arc::new(AtomicUsize::new(0));
    root.add_commands(
        [counting_command("edit.copy", "Ctrl+C", &hits)],
        ConflictPolicy::default(),
    );

    // The failing command is handled (and consumed) without propagating.
    let event = KeyEvent::new(Key::F9, KeyboardModifiers::NONE);
    assert!(root.dispatch_to_focused_command(&event));
    assert!(event.is_consumed());
    assert_eq!(
        *failures.lock(),
        vec!["command failed: circular reference".to_string()]
    );

    // Subsequent dispatch is unaffected.
    let event = KeyEvent::new(Key::C, KeyboardModifiers::CTRL);
    assert!(root.dispatch_to_focused_command(&event));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[test]
fn structural_notifications_arrive_in_post_order() {
    init_logging();
    let registry: Arc<CommandRegistry> = CommandRegistry::new("app");
    let root = registry.root();

    let events = Arc::new(Mutex::new(Vec::new()));
    let events_clone = events.clone();
    root.changed_signal().unwrap().connect(move |event| {
        events_clone.lock().push(format!("{event:?}"));
    });

    let grid = root
        .create_child_group(None, "grid", ConflictPolicy::default())
        .unwrap();
    grid.add_commands(
        [Arc::new(Command::new("edit.copy").with_callback(|_| Ok(true)))],
        ConflictPolicy::default(),
    );
    grid.activate();

    assert!(events.lock().is_empty());
    registry.run_pending();

    let got = events.lock();
    assert_eq!(got.len(), 3);
    assert!(got[0].contains("ChildCreated"));
    assert!(got[1].contains("CommandsAdded"));
    assert!(got[2].contains("ActivationChanged"));
}
