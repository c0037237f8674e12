// ============================================
// dialogs.rs - Native file pickers, message boxes and the clipboard
// ============================================
// The only module that talks to the desktop directly. Panels ask for
// things through the Interaction trait; this is the real implementation.
// ============================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use tracing::{debug, info};

use crate::panel::{Interaction, Notice, NoticeKind, PanelState};
use crate::stego;
use crate::tools::{FileFilter, ToolSpec};

/// Message boxes and the "locate executable" picker
pub struct NativeDialogs {
    /// Where the executable picker starts
    app_dir: PathBuf,
}

impl NativeDialogs {
    pub fn new(app_dir: PathBuf) -> Self {
        Self { app_dir }
    }
}

impl Interaction for NativeDialogs {
    fn notify(&self, notice: Notice) {
        let level = match notice.kind {
            NoticeKind::Info => MessageLevel::Info,
            NoticeKind::Warning => MessageLevel::Warning,
            NoticeKind::Error => MessageLevel::Error,
        };
        MessageDialog::new()
            .set_level(level)
            .set_title(notice.title.as_str())
            .set_description(notice.text.as_str())
            .set_buttons(MessageButtons::Ok)
            .show();
    }

    fn confirm(&self, title: &str, text: &str) -> bool {
        let answer = MessageDialog::new()
            .set_level(MessageLevel::Warning)
            .set_title(title)
            .set_description(text)
            .set_buttons(MessageButtons::YesNo)
            .show();
        answer == MessageDialogResult::Yes
    }

    fn locate_manually(&self, tool: &ToolSpec) -> Option<PathBuf> {
        let picked = FileDialog::new()
            .set_title(format!("Locate {} executable", tool.display_name).as_str())
            .add_filter("Executables", &["exe", "lnk"])
            .add_filter("All files", &["*"])
            .set_directory(&self.app_dir)
            .pick_file();
        match &picked {
            Some(path) => info!(tool = tool.id, path = %path.display(), "user located executable"),
            None => debug!(tool = tool.id, "locate dialog cancelled"),
        }
        picked
    }
}

fn with_filters(mut dialog: FileDialog, filters: &[FileFilter]) -> FileDialog {
    for filter in filters {
        dialog = dialog.add_filter(filter.name, filter.extensions);
    }
    dialog
}

/// Folder of the current value, if it points somewhere real
fn start_dir(current: &str) -> Option<PathBuf> {
    let current = current.trim();
    if current.is_empty() {
        return None;
    }
    let dir = stego::parent_dir(Path::new(current));
    dir.is_dir().then_some(dir)
}

/// "Browse" next to the input file
pub fn pick_input_file(tool: &ToolSpec, state: &PanelState) -> Option<PathBuf> {
    let mut dialog = with_filters(
        FileDialog::new().set_title(format!("Select input file for {}", tool.display_name).as_str()),
        tool.input_filters,
    );
    if let Some(dir) = start_dir(&state.input_file) {
        dialog = dialog.set_directory(dir);
    }
    dialog.pick_file()
}

/// "Browse" next to the output file
pub fn pick_output_file(tool: &ToolSpec, state: &PanelState) -> Option<PathBuf> {
    let mut dialog = with_filters(
        FileDialog::new().set_title(format!("Save {} output as", tool.display_name).as_str()),
        tool.output_filters,
    );
    let current = if state.output_file.trim().is_empty() {
        state.input_file.as_str()
    } else {
        state.output_file.as_str()
    };
    if let Some(dir) = start_dir(current) {
        dialog = dialog.set_directory(dir);
    }
    if let Some(name) = Path::new(state.output_file.trim()).file_name() {
        dialog = dialog.set_file_name(name.to_string_lossy());
    }
    dialog.save_file()
}

pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard = arboard::Clipboard::new().context("Clipboard is not available")?;
    clipboard
        .set_text(text.to_string())
        .context("Failed to copy to clipboard")?;
    Ok(())
}
