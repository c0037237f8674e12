// ============================================
// Stego Launcher - main.rs
// ============================================
// This is the entry point of the application.
//
// The program flow is:
// 1. main() starts, sets up logging and finds the Tools folder
// 2. Create the main window (one card per tool category)
// 3. "Open Tools" on a card opens that category's window, or brings the
//    existing one back
// 4. Each category window keeps one PanelState per tool tab; button
//    callbacks hand that state to panel.rs and show the result
// 5. Run the UI event loop (keeps the windows open)
// ============================================

// Include the compiled Slint UI code
// This macro reads the generated code from build.rs
slint::include_modules!();

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use slint::{CloseRequestResponse, ComponentHandle, ModelRc, VecModel};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// Our modules
mod dialogs;   // Native dialogs and clipboard
mod launcher;  // Spawning tools, capturing output
mod locator;   // Finding tool executables
mod log_panel; // Log panel contents
mod panel;     // Hide / extract / launch flows
mod settings;  // settings.json and tools.toml
mod stego;     // Per-tool command lines
mod tools;     // The tool catalog

use dialogs::NativeDialogs;
use locator::Locator;
use panel::{Interaction, Notice, PanelState, Toolbox};
use settings::{Settings, ToolManifest};
use tools::{Category, ToolMode, HeadlessKind, ToolSpec};

// ============================================
// MAIN FUNCTION
// ============================================

fn main() -> Result<(), slint::PlatformError> {
    init_logging();
    info!(version = env!("CARGO_PKG_VERSION"), "Stego Launcher starting");

    // Log key paths for debugging
    let app_dir = tools::get_app_directory();
    let cwd = std::env::current_dir().unwrap_or_else(|_| app_dir.clone());
    info!(exe = ?std::env::current_exe().unwrap_or_default(), "executable");
    info!(app_dir = %app_dir.display(), cwd = %cwd.display(), "search roots");

    let settings_path = app_dir.join(settings::SETTINGS_FILE_NAME);
    let settings = Settings::load(&settings_path);
    let manifest = load_manifest(&app_dir);
    let tools_dir = resolve_tools_dir(&app_dir, &manifest);

    let locator = Locator::new(vec![app_dir.clone(), cwd], tools_dir, manifest);
    info!(roots = ?locator.roots(), tools_dir = %locator.tools_dir().display(), "locator ready");
    let tools_dir_text = locator.tools_dir().to_string_lossy().to_string();
    let toolbox = Rc::new(RefCell::new(Toolbox::new(locator, settings, Some(settings_path))));
    let dialogs = Rc::new(NativeDialogs::new(app_dir));

    // MainWindow is defined in src/ui/main.slint
    let ui = MainWindow::new()?;
    ui.set_version(format!("v{}", env!("CARGO_PKG_VERSION")).into());
    ui.set_tools_dir(tools_dir_text.into());
    ui.set_rows(category_rows());

    // Closing the main window closes the category windows too
    ui.window().on_close_requested(|| {
        if let Err(e) = slint::quit_event_loop() {
            warn!(err = %e, "could not stop event loop");
        }
        CloseRequestResponse::HideWindow
    });

    // One window per category, reused when the card is clicked again
    let windows: Rc<RefCell<HashMap<&'static str, CategoryWindow>>> = Rc::default();
    let ui_handle = ui.as_weak();

    // Callback: "Open Tools" on a category card
    ui.on_open_category({
        let ui = ui_handle.clone();
        move |id| {
            debug!(category = %id, "open category clicked");
            let Some(category) = tools::category_by_id(&id) else {
                warn!(category = %id, "unknown category");
                return;
            };

            let status = match show_category_window(category, &windows, &toolbox, &dialogs) {
                Ok(()) => format!("Opened {}", category.title),
                Err(e) => {
                    error!(category = category.id, err = %e, "could not open category window");
                    format!("Error: {}", e)
                }
            };
            if let Some(ui) = ui.upgrade() {
                ui.set_status_text(status.into());
            }
        }
    });

    info!("Starting UI...");
    ui.run()
}

// ============================================
// STARTUP HELPERS
// ============================================

/// Console logging; RUST_LOG overrides the default level
fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stego_launcher=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// tools.toml next to the EXE; a broken file is logged and ignored
fn load_manifest(app_dir: &Path) -> ToolManifest {
    let path = app_dir.join(settings::MANIFEST_FILE_NAME);
    match ToolManifest::load(&path) {
        Ok(manifest) => {
            if !manifest.tools.is_empty() {
                info!(entries = manifest.tools.len(), "loaded tools.toml");
            }
            for entry in &manifest.tools {
                if tools::tool_by_id(&entry.id).is_none() {
                    warn!(id = %entry.id, "tools.toml names an unknown tool");
                }
            }
            manifest
        }
        Err(e) => {
            warn!(err = %format!("{:#}", e), "ignoring tools.toml");
            ToolManifest::default()
        }
    }
}

fn resolve_tools_dir(app_dir: &Path, manifest: &ToolManifest) -> PathBuf {
    match &manifest.tools_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => app_dir.join(dir),
        None => tools::default_tools_directory(app_dir),
    }
}

/// Cards for the main window, two per row
fn category_rows() -> ModelRc<CategoryRow> {
    let cards: Vec<CategoryCard> = tools::categories()
        .iter()
        .map(|c| CategoryCard {
            id: c.id.into(),
            title: c.title.into(),
            tools: c.blurb().into(),
        })
        .collect();

    let rows: Vec<CategoryRow> = cards
        .chunks(2)
        .map(|pair| CategoryRow {
            left: pair[0].clone(),
            right: pair.get(1).cloned().unwrap_or_default(),
            has_right: pair.len() > 1,
        })
        .collect();
    ModelRc::new(VecModel::from(rows))
}

/// What the category window needs to lay out a tool's panel
fn tool_tab(tool: &ToolSpec) -> ToolTab {
    ToolTab {
        id: tool.id.into(),
        name: tool.display_name.into(),
        description: tool.description.into(),
        headless: tool.is_headless(),
        uses_password: tool.uses_password(),
        has_output: tool.has_output_file(),
        has_stream: tool.mode == ToolMode::Headless(HeadlessKind::AdsStream),
        opens_file: tool.opens_input_file,
        can_analyze: tool.can_analyze,
        can_list: tool.mode == ToolMode::Headless(HeadlessKind::AdsStream),
    }
}

// ============================================
// CATEGORY WINDOWS
// ============================================

/// Form state of every tool tab in one category window
struct CategorySession {
    category: &'static Category,
    states: Vec<PanelState>,
    current: usize,
}

impl CategorySession {
    fn new(category: &'static Category, stream_name: &str) -> Self {
        Self {
            category,
            states: category.tools.iter().map(|_| PanelState::new(stream_name)).collect(),
            current: 0,
        }
    }

    fn tool(&self) -> &'static ToolSpec {
        self.category.tools[self.current]
    }

    fn state_mut(&mut self) -> &mut PanelState {
        &mut self.states[self.current]
    }

    /// Switch tabs; false when `index` is out of range or already selected
    fn select(&mut self, index: usize) -> bool {
        if index >= self.states.len() || index == self.current {
            return false;
        }
        self.current = index;
        true
    }

    /// Copy the editable fields from the window into the current state
    fn store(&mut self, window: &CategoryWindow) {
        let state = self.state_mut();
        state.input_file = window.get_input_file().to_string();
        state.output_file = window.get_output_file().to_string();
        state.message = window.get_message().to_string();
        state.password = window.get_password().to_string();
        state.stream_name = window.get_stream_name().to_string();
    }

    /// Put the current tool and its state on screen
    fn show(&self, window: &CategoryWindow) {
        let state = &self.states[self.current];
        window.set_current_tab(self.current as i32);
        window.set_tool(tool_tab(self.tool()));
        window.set_input_file(state.input_file.as_str().into());
        window.set_output_file(state.output_file.as_str().into());
        window.set_message(state.message.as_str().into());
        window.set_password(state.password.as_str().into());
        window.set_stream_name(state.stream_name.as_str().into());
        window.set_extracted(state.extracted.as_str().into());
        window.set_hide_log(state.hide_log.text().into());
        window.set_extract_log(state.extract_log.text().into());
    }
}

/// Shared handles every category window callback needs
#[derive(Clone)]
struct WindowContext {
    window: slint::Weak<CategoryWindow>,
    session: Rc<RefCell<CategorySession>>,
    toolbox: Rc<RefCell<Toolbox>>,
    dialogs: Rc<NativeDialogs>,
}

impl WindowContext {
    /// Store the form, run `action` on the current tool, show the result.
    ///
    /// Dialogs spin a nested event loop, so a second click can arrive while
    /// a flow is still running; that click is dropped.
    fn run(&self, action: impl FnOnce(&mut Toolbox, &'static ToolSpec, &mut PanelState, &dyn Interaction)) {
        let Some(window) = self.window.upgrade() else { return };
        let Ok(mut session) = self.session.try_borrow_mut() else {
            debug!("panel busy, ignoring click");
            return;
        };
        let Ok(mut toolbox) = self.toolbox.try_borrow_mut() else {
            debug!("toolbox busy, ignoring click");
            return;
        };

        session.store(&window);
        let tool = session.tool();
        let ui: &dyn Interaction = self.dialogs.as_ref();
        action(&mut *toolbox, tool, session.state_mut(), ui);
        session.show(&window);
    }
}

fn show_category_window(
    category: &'static Category,
    windows: &RefCell<HashMap<&'static str, CategoryWindow>>,
    toolbox: &Rc<RefCell<Toolbox>>,
    dialogs: &Rc<NativeDialogs>,
) -> Result<(), slint::PlatformError> {
    if let Some(window) = windows.borrow().get(category.id) {
        debug!(category = category.id, "bringing existing window back");
        return window.show();
    }

    let window = create_category_window(category, toolbox.clone(), dialogs.clone())?;
    window.show()?;
    windows.borrow_mut().insert(category.id, window);
    info!(category = category.id, "category window opened");
    Ok(())
}

fn create_category_window(
    category: &'static Category,
    toolbox: Rc<RefCell<Toolbox>>,
    dialogs: Rc<NativeDialogs>,
) -> Result<CategoryWindow, slint::PlatformError> {
    let window = CategoryWindow::new()?;
    let stream_name = toolbox.borrow().settings().ads_stream_name.clone();
    let session = CategorySession::new(category, &stream_name);

    window.set_category_title(category.title.into());
    let tabs: Vec<ToolTab> = category.tools.iter().map(|t| tool_tab(t)).collect();
    window.set_tabs(ModelRc::new(VecModel::from(tabs)));
    session.show(&window);

    let ctx = WindowContext {
        window: window.as_weak(),
        session: Rc::new(RefCell::new(session)),
        toolbox,
        dialogs,
    };

    // Callback: a tool tab was clicked. Auto-launch tools start right away.
    window.on_tool_selected({
        let ctx = ctx.clone();
        move |index| {
            let Some(window) = ctx.window.upgrade() else { return };
            {
                let Ok(mut session) = ctx.session.try_borrow_mut() else { return };
                session.store(&window);
                if index < 0 || !session.select(index as usize) {
                    return;
                }
                debug!(tool = session.tool().id, "tool tab selected");
                window.set_mode_tab(0);
                session.show(&window);
            }
            ctx.run(|toolbox, tool, state, ui| panel::select(toolbox, tool, state, ui));
        }
    });

    // Callback: Browse for the input file
    window.on_browse_input({
        let ctx = ctx.clone();
        move || {
            ctx.run(|_, tool, state, _| match dialogs::pick_input_file(tool, state) {
                Some(path) => {
                    debug!(path = %path.display(), "input selected");
                    state.set_input(&path);
                }
                None => debug!("input selection cancelled"),
            });
        }
    });

    // Callback: Browse for the output file
    window.on_browse_output({
        let ctx = ctx.clone();
        move || {
            ctx.run(|_, tool, state, _| match dialogs::pick_output_file(tool, state) {
                Some(path) => {
                    debug!(path = %path.display(), "output selected");
                    state.set_output(&path);
                }
                None => debug!("output selection cancelled"),
            });
        }
    });

    window.on_hide_message({
        let ctx = ctx.clone();
        move || ctx.run(|toolbox, tool, state, ui| panel::hide(toolbox, tool, state, ui))
    });

    window.on_extract({
        let ctx = ctx.clone();
        move || ctx.run(|toolbox, tool, state, ui| panel::extract(toolbox, tool, state, ui))
    });

    window.on_launch({
        let ctx = ctx.clone();
        move || ctx.run(|toolbox, tool, state, ui| panel::launch(toolbox, tool, state, ui))
    });

    window.on_analyze({
        let ctx = ctx.clone();
        move || ctx.run(|_, tool, state, ui| panel::analyze(tool, state, ui))
    });

    window.on_list_streams({
        let ctx = ctx.clone();
        move || ctx.run(|toolbox, tool, state, ui| panel::list_streams(toolbox, tool, state, ui))
    });

    // Callback: Copy the extracted message
    window.on_copy_extracted({
        let ctx = ctx.clone();
        move || {
            ctx.run(|_, _, state, ui| {
                if state.extracted.is_empty() {
                    return;
                }
                match dialogs::copy_to_clipboard(&state.extracted) {
                    Ok(()) => ui.notify(Notice::info("Copied", "Message copied to clipboard!")),
                    Err(e) => ui.notify(Notice::error("Error", format!("{:#}", e))),
                }
            });
        }
    });

    Ok(window)
}
