// ============================================
// panel.rs - What happens when a tool tab's buttons are pressed
// ============================================
// One PanelState per tool tab holds the form fields and the two logs.
// The functions here validate the form, find the executable, run it and
// write the story into the log. Anything that needs the user (message
// boxes, "where is DeepSound.exe?") goes through the Interaction trait so
// the flows can be tested without a window.
//
// Flow of a headless hide:
//   validate -> clear log -> locate EXE -> write message file
//   -> run with flags -> log return code/output -> SUCCESS or ERROR
// ============================================

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Result;
use thiserror::Error;
use tracing::{info, warn};

use crate::launcher::{self, CommandOutput, LaunchRequest};
use crate::locator::Locator;
use crate::log_panel::LogBuffer;
use crate::settings::Settings;
use crate::stego::{self, ExtractedText, Invocation, ScratchFile};
use crate::tools::{ExeRole, HeadlessKind, ToolMode, ToolSpec};

// ============================================
// TALKING TO THE USER
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Warning,
    Error,
}

/// A message box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub text: String,
}

impl Notice {
    pub fn info(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, title: title.into(), text: text.into() }
    }

    pub fn warning(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Warning, title: title.into(), text: text.into() }
    }

    pub fn error(title: impl Into<String>, text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, title: title.into(), text: text.into() }
    }
}

/// Everything a flow may need from the user
pub trait Interaction {
    fn notify(&self, notice: Notice);
    /// Yes/No question
    fn confirm(&self, title: &str, text: &str) -> bool;
    /// File dialog for an executable the candidates did not find
    fn locate_manually(&self, tool: &ToolSpec) -> Option<PathBuf>;
}

/// Form problems caught before anything runs
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please select an input file.")]
    MissingInput,
    #[error("Input file does not exist.")]
    InputNotFound,
    #[error("Please choose an output file.")]
    MissingOutput,
    #[error("Please enter a secret message.")]
    MissingMessage,
    #[error("Password is required for this tool.")]
    MissingPassword,
    #[error("Please enter a stream name.")]
    MissingStreamName,
    #[error("Stream names cannot contain ':', '\\' or '/'.")]
    InvalidStreamName,
}

// ============================================
// PANEL STATE
// ============================================

/// Form fields and logs of one tool tab
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    pub input_file: String,
    pub output_file: String,
    pub message: String,
    pub password: String,
    pub stream_name: String,
    pub extracted: String,
    pub hide_log: LogBuffer,
    pub extract_log: LogBuffer,
}

impl PanelState {
    pub fn new(stream_name: &str) -> Self {
        Self { stream_name: stream_name.to_string(), ..Self::default() }
    }

    /// Set the input file; fills in "<name>_stego.<ext>" if output is empty
    pub fn set_input(&mut self, path: &Path) {
        self.input_file = path.to_string_lossy().into_owned();
        if self.output_file.trim().is_empty() {
            self.output_file = suggest_output(path).to_string_lossy().into_owned();
        }
    }

    pub fn set_output(&mut self, path: &Path) {
        self.output_file = path.to_string_lossy().into_owned();
    }

    fn message_text(&self) -> &str {
        self.message.trim()
    }

    fn input_path(&self) -> PathBuf {
        PathBuf::from(self.input_file.trim())
    }

    fn output_path(&self) -> PathBuf {
        PathBuf::from(self.output_file.trim())
    }

    pub fn validate(&self, require_message: bool, require_password: bool) -> Result<(), ValidationError> {
        if self.input_file.trim().is_empty() {
            return Err(ValidationError::MissingInput);
        }
        if !self.input_path().exists() {
            return Err(ValidationError::InputNotFound);
        }
        if require_message && self.message_text().is_empty() {
            return Err(ValidationError::MissingMessage);
        }
        if require_password && self.password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok(())
    }

    fn validate_output(&self) -> Result<(), ValidationError> {
        if self.output_file.trim().is_empty() {
            return Err(ValidationError::MissingOutput);
        }
        Ok(())
    }

    fn validate_stream_name(&self) -> Result<(), ValidationError> {
        let name = self.stream_name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingStreamName);
        }
        if !stego::is_valid_stream_name(name) {
            return Err(ValidationError::InvalidStreamName);
        }
        Ok(())
    }
}

/// "C:/pics/cat.png" -> "C:/pics/cat_stego.png"
pub fn suggest_output(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match input.extension() {
        Some(ext) => format!("{}_stego.{}", stem, ext.to_string_lossy()),
        None => format!("{}_stego", stem),
    };
    input.with_file_name(name)
}

// ============================================
// TOOLBOX
// ============================================

/// Shared by every panel: where tools are and what the user told us
#[derive(Debug)]
pub struct Toolbox {
    locator: Locator,
    settings: Settings,
    settings_path: Option<PathBuf>,
}

impl Toolbox {
    pub fn new(locator: Locator, settings: Settings, settings_path: Option<PathBuf>) -> Self {
        Self { locator, settings, settings_path }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn locate(&self, tool: &ToolSpec, role: ExeRole) -> Option<PathBuf> {
        self.locator.locate(tool, role, &self.settings)
    }

    /// Remember a hand-picked executable and persist it
    pub fn remember(&mut self, tool: &ToolSpec, role: ExeRole, path: PathBuf) {
        self.settings.remember(tool, role, path);
        self.persist();
    }

    /// Drop a remembered executable that no longer starts
    pub fn forget_if_remembered(&mut self, tool: &ToolSpec, role: ExeRole, path: &Path) {
        if self.settings.remembered_path(tool, role) == Some(path) {
            info!(tool = tool.id, path = %path.display(), "forgetting executable that failed to start");
            self.settings.forget(tool, role);
            self.persist();
        }
    }

    fn persist(&self) {
        if let Some(settings_path) = &self.settings_path {
            if let Err(e) = self.settings.save(settings_path) {
                warn!(err = %format!("{:#}", e), "could not save settings");
            }
        }
    }

    /// Log the command line, run it, log what came back
    fn run_logged(&self, exe: &Path, invocation: &Invocation, log: &mut LogBuffer) -> Result<CommandOutput> {
        log.info(format!("Running: {}", launcher::render_command(exe, &invocation.args)));
        let mut request = LaunchRequest::new(exe).args(invocation.args.iter().cloned());
        if let Some(cwd) = &invocation.cwd {
            request = request.cwd(cwd);
        }
        let output = launcher::run_captured(&request, self.settings.timeout_or(invocation.timeout))?;
        log_output(&output, log);
        Ok(output)
    }
}

fn log_output(output: &CommandOutput, log: &mut LogBuffer) {
    match output.exit_code {
        Some(code) => log.info(format!("Return code: {}", code)),
        None => log.info("Return code: none (process was terminated)"),
    }
    let stdout = output.stdout_text();
    if !stdout.trim().is_empty() {
        log.info(format!("Stdout: {}", stdout.trim_end()));
    }
    let stderr = output.stderr_text();
    if !stderr.trim().is_empty() {
        log.info(format!("Stderr: {}", stderr.trim_end()));
    }
}

/// Best single-line explanation of a failed run
fn failure_reason(output: &CommandOutput) -> String {
    let stderr = output.stderr_text();
    if !stderr.trim().is_empty() {
        return stderr.trim().to_string();
    }
    let stdout = output.stdout_text();
    if !stdout.trim().is_empty() {
        return stdout.trim().to_string();
    }
    match output.exit_code {
        Some(code) => format!("exit code {}", code),
        None => "process was terminated".to_string(),
    }
}

fn reject(ui: &dyn Interaction, error: ValidationError) {
    info!(reason = %error, "form rejected");
    ui.notify(Notice::error("Error", error.to_string()));
}

fn report_missing(tool: &ToolSpec, role: ExeRole, log: &mut LogBuffer, ui: &dyn Interaction) {
    let text = format!(
        "{} executable not found. Please ensure {} is in the Tools directory.",
        tool.display_name,
        tool.expected_file_name(role)
    );
    log.error(&text);
    ui.notify(Notice::error("Error", text));
}

fn report_timeout(log: &mut LogBuffer, ui: &dyn Interaction) {
    log.error("Operation timed out");
    ui.notify(Notice::error("Error", "Operation timed out"));
}

fn report_exception(error: anyhow::Error, log: &mut LogBuffer, ui: &dyn Interaction) {
    log.error(format!("Exception: {:#}", error));
    ui.notify(Notice::error("Error", format!("An error occurred: {:#}", error)));
}

// ============================================
// HIDE
// ============================================

/// "Hide Message" button
pub fn hide(toolbox: &mut Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    let kind = match tool.mode {
        ToolMode::Headless(kind) => kind,
        ToolMode::Gui => return launch(toolbox, tool, state, ui),
    };

    let checked = match kind {
        HeadlessKind::AdsStream => state
            .validate(true, false)
            .and_then(|()| state.validate_stream_name()),
        HeadlessKind::GifShuffle => state
            .validate(true, false)
            .and_then(|()| state.validate_output()),
        _ => state
            .validate(true, tool.needs_password)
            .and_then(|()| state.validate_output()),
    };
    if let Err(e) = checked {
        return reject(ui, e);
    }

    state.hide_log.clear();
    state.hide_log.info(format!("Starting {} hide operation...", tool.display_name));

    let result = match kind {
        HeadlessKind::Steghide => hide_with_message_file(toolbox, tool, state, ui, |_, msg, st| {
            stego::steghide_embed(&st.input_path(), msg, &st.output_path(), &st.password)
        }),
        HeadlessKind::Mp3Stego => {
            if !stego::is_wav(&state.input_path()) {
                let text = "MP3Stego requires a WAV input file (uncompressed).\n\
                            Please convert your audio to WAV and try again.";
                state.hide_log.error("MP3Stego requires a WAV input file. Please convert your audio to WAV.");
                ui.notify(Notice::error("Error", text));
                return;
            }
            hide_with_message_file(toolbox, tool, state, ui, |exe, msg, st| {
                stego::mp3stego_encode(exe, msg, &st.password, &st.input_path(), &st.output_path())
            })
        }
        HeadlessKind::Snow => hide_with_message_file(toolbox, tool, state, ui, |_, msg, st| {
            stego::snow_conceal(&st.input_path(), msg, &st.output_path(), &st.password)
        }),
        HeadlessKind::GifShuffle => hide_gifshuffle(toolbox, tool, state, ui),
        HeadlessKind::AdsStream => hide_in_stream(state, ui),
    };

    if let Err(e) = result {
        report_exception(e, &mut state.hide_log, ui);
    }
}

/// Tools that read the message from a file: write it, run, clean up
fn hide_with_message_file(
    toolbox: &Toolbox,
    tool: &ToolSpec,
    state: &mut PanelState,
    ui: &dyn Interaction,
    build: impl FnOnce(&Path, &Path, &PanelState) -> Invocation,
) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        report_missing(tool, ExeRole::Main, &mut state.hide_log, ui);
        return Ok(());
    };

    let output_dir = stego::parent_dir(&state.output_path());
    let scratch = ScratchFile::with_contents(&output_dir, "stego_msg", state.message_text())?;
    let invocation = build(&exe, scratch.path(), state);
    let output = toolbox.run_logged(&exe, &invocation, &mut state.hide_log)?;
    drop(scratch);

    finish_hide(&output, state, ui);
    Ok(())
}

fn hide_gifshuffle(toolbox: &Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        report_missing(tool, ExeRole::Main, &mut state.hide_log, ui);
        return Ok(());
    };
    let invocation = stego::gifshuf_conceal(
        &exe,
        state.message_text(),
        &state.password,
        &state.input_path(),
        &state.output_path(),
    );
    let output = toolbox.run_logged(&exe, &invocation, &mut state.hide_log)?;
    finish_hide(&output, state, ui);
    Ok(())
}

fn finish_hide(output: &CommandOutput, state: &mut PanelState, ui: &dyn Interaction) {
    if output.timed_out {
        return report_timeout(&mut state.hide_log, ui);
    }
    if output.success() {
        state.hide_log.success("Message hidden successfully!");
        ui.notify(Notice::info(
            "Success",
            format!("Message hidden successfully!\nOutput saved to: {}", state.output_file.trim()),
        ));
    } else {
        let reason = failure_reason(output);
        state.hide_log.error(format!("Error: {}", reason));
        ui.notify(Notice::error("Error", format!("Failed to hide message:\n{}", reason)));
    }
}

fn hide_in_stream(state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let file = state.input_path();
    let stream = state.stream_name.trim().to_string();
    match stego::write_stream(&file, &stream, state.message_text()) {
        Ok(path) => {
            state.hide_log.success(format!("Message hidden successfully in stream: {}", path.display()));
            state.hide_log.info(format!("File: {}", file.display()));
            state.hide_log.info(format!("Stream: {}", stream));
            ui.notify(Notice::info(
                "Success",
                format!("Message hidden successfully!\nStream: {}", path.display()),
            ));
        }
        Err(e) => {
            state.hide_log.error(format!("Error writing to ADS: {:#}", e));
            state.hide_log.info("Note: ADS is only supported on NTFS file systems.");
            ui.notify(Notice::error(
                "Error",
                format!(
                    "Failed to write to ADS:\n{:#}\n\nNote: ADS is only supported on NTFS file systems.",
                    e
                ),
            ));
        }
    }
    Ok(())
}

// ============================================
// EXTRACT
// ============================================

/// "Extract Message" button
pub fn extract(toolbox: &mut Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    let kind = match tool.mode {
        ToolMode::Headless(kind) => kind,
        ToolMode::Gui => return launch(toolbox, tool, state, ui),
    };

    let checked = match kind {
        HeadlessKind::AdsStream => state
            .validate(false, false)
            .and_then(|()| state.validate_stream_name()),
        HeadlessKind::GifShuffle => state.validate(false, false),
        _ => state.validate(false, tool.needs_password),
    };
    if let Err(e) = checked {
        return reject(ui, e);
    }

    state.extract_log.clear();
    state.extract_log.info(format!("Starting {} extract operation...", tool.display_name));

    let result = match kind {
        HeadlessKind::Steghide => extract_steghide(toolbox, tool, state, ui),
        HeadlessKind::Mp3Stego => extract_mp3stego(toolbox, tool, state, ui),
        HeadlessKind::Snow => extract_snow(toolbox, tool, state, ui),
        HeadlessKind::GifShuffle => extract_gifshuffle(toolbox, tool, state, ui),
        HeadlessKind::AdsStream => {
            extract_from_stream(state, ui);
            Ok(())
        }
    };

    if let Err(e) = result {
        report_exception(e, &mut state.extract_log, ui);
    }
}

fn extracted_ok(state: &mut PanelState, ui: &dyn Interaction, message: String) {
    state.extracted = message;
    state.extract_log.success("Message extracted successfully!");
    ui.notify(Notice::info("Success", "Message extracted successfully!"));
}

fn extract_failed(output: &CommandOutput, state: &mut PanelState, ui: &dyn Interaction) {
    if output.timed_out {
        return report_timeout(&mut state.extract_log, ui);
    }
    let reason = failure_reason(output);
    state.extract_log.error(format!("Error: {}", reason));
    ui.notify(Notice::error("Error", format!("Failed to extract message:\n{}", reason)));
}

fn extract_steghide(toolbox: &Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        report_missing(tool, ExeRole::Main, &mut state.extract_log, ui);
        return Ok(());
    };
    let input = state.input_path();
    let scratch = ScratchFile::reserve(&stego::parent_dir(&input), "stego_extract");
    let invocation = stego::steghide_extract(&input, scratch.path(), &state.password);
    let output = toolbox.run_logged(&exe, &invocation, &mut state.extract_log)?;

    match (output.success(), scratch.read()?) {
        (true, Some(message)) => extracted_ok(state, ui, message),
        _ => extract_failed(&output, state, ui),
    }
    Ok(())
}

fn extract_mp3stego(toolbox: &Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Extract) else {
        report_missing(tool, ExeRole::Extract, &mut state.extract_log, ui);
        return Ok(());
    };
    let input = state.input_path();
    let invocation = stego::mp3stego_decode(&exe, &state.password, &input);
    let output = toolbox.run_logged(&exe, &invocation, &mut state.extract_log)?;

    let message_file = stego::mp3stego_output_file(&input);
    if output.success() && message_file.is_file() {
        let bytes = fs::read(&message_file)?;
        if let Err(e) = fs::remove_file(&message_file) {
            warn!(path = %message_file.display(), err = %e, "could not remove decoded message file");
        }
        extracted_ok(state, ui, String::from_utf8_lossy(&bytes).into_owned());
    } else {
        extract_failed(&output, state, ui);
    }
    Ok(())
}

fn extract_snow(toolbox: &Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        report_missing(tool, ExeRole::Main, &mut state.extract_log, ui);
        return Ok(());
    };
    let input = state.input_path();
    let scratch = ScratchFile::reserve(&stego::parent_dir(&input), "snow_extracted_msg");
    state.extract_log.info(format!("Input file: {}", input.display()));
    state.extract_log.info(format!("Output file: {}", scratch.path().display()));

    let invocation = stego::snow_extract(&input, scratch.path(), &state.password);
    let output = toolbox.run_logged(&exe, &invocation, &mut state.extract_log)?;
    if output.timed_out {
        report_timeout(&mut state.extract_log, ui);
        return Ok(());
    }

    match scratch.read()? {
        Some(message) if message.is_empty() => {
            state.extracted.clear();
            state.extract_log.info("Message file is empty.");
            ui.notify(Notice::info("Info", "No message content found."));
        }
        Some(message) => {
            let chars = message.chars().count();
            state.extracted = message;
            state
                .extract_log
                .success(format!("Message extracted successfully! Length: {} characters", chars));
            ui.notify(Notice::info("Success", "Message extracted successfully!"));
        }
        None => {
            state
                .extract_log
                .error(format!("Message file was not created at: {}", scratch.path().display()));
            state.extract_log.error("This could mean:");
            state.extract_log.error("1. The password is incorrect");
            state.extract_log.error("2. The file doesn't contain a valid SNOW-encoded message");
            state.extract_log.error("3. The input file is corrupted or not readable");
            ui.notify(Notice::error(
                "Error",
                "Failed to extract message.\n\nNote: Ensure the correct password is used and \
                 the file contains a valid SNOW-encoded message.",
            ));
        }
    }
    Ok(())
}

fn extract_gifshuffle(toolbox: &Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        report_missing(tool, ExeRole::Main, &mut state.extract_log, ui);
        return Ok(());
    };
    let input = state.input_path();
    let invocation = stego::gifshuf_extract(&exe, &state.password, &input);
    let output = toolbox.run_logged(&exe, &invocation, &mut state.extract_log)?;

    if output.timed_out {
        report_timeout(&mut state.extract_log, ui);
        return Ok(());
    }
    if !output.success() {
        let reason = failure_reason(&output);
        state.extract_log.error(format!("GIF Shuffle failed: {}", reason));
        ui.notify(Notice::error("Error", format!("Extraction failed:\n{}", reason)));
        return Ok(());
    }

    match stego::classify_output(&output.stdout) {
        ExtractedText::Empty => {
            state.extract_log.error("No message found or extraction returned empty output.");
            ui.notify(Notice::warning(
                "Warning",
                "No message found or extraction returned empty output.",
            ));
        }
        ExtractedText::Binary => {
            state.extract_log.error("Extraction returned non-text output, likely wrong password.");
            let save = ui.confirm(
                "Possible wrong password",
                "Extraction produced non-text output (likely wrong password).\n\
                 Do you want to save the raw output to a file for inspection?",
            );
            if save {
                let raw_path = stego::parent_dir(&input).join(stego::GIFSHUF_RAW_FILE_NAME);
                match fs::write(&raw_path, &output.stdout) {
                    Ok(()) => {
                        state.extract_log.info(format!("Raw output saved to: {}", raw_path.display()));
                        ui.notify(Notice::info(
                            "Saved",
                            format!("Raw output saved to:\n{}", raw_path.display()),
                        ));
                    }
                    Err(e) => ui.notify(Notice::error(
                        "Error",
                        format!("Failed to save raw output:\n{}", e),
                    )),
                }
            }
        }
        ExtractedText::Text(message) => {
            state.extract_log.info(format!("Extracted message: {}", message.trim_end()));
            extracted_ok(state, ui, message);
        }
    }
    Ok(())
}

fn extract_from_stream(state: &mut PanelState, ui: &dyn Interaction) {
    let file = state.input_path();
    let stream = state.stream_name.trim().to_string();
    let path = stego::stream_path(&file, &stream);
    match stego::read_stream(&file, &stream) {
        Ok(message) => {
            state.extracted = message;
            state
                .extract_log
                .success(format!("Message extracted successfully from stream: {}", path.display()));
            state.extract_log.info(format!("File: {}", file.display()));
            state.extract_log.info(format!("Stream: {}", stream));
            ui.notify(Notice::info("Success", "Message extracted successfully!"));
        }
        Err(e) => {
            let not_found = e
                .root_cause()
                .downcast_ref::<io::Error>()
                .map(|io| io.kind() == io::ErrorKind::NotFound)
                .unwrap_or(false);
            if not_found {
                state.extract_log.error(format!("Stream not found: {}", path.display()));
                ui.notify(Notice::error("Error", format!("Stream not found: {}", path.display())));
            } else {
                state.extract_log.error(format!("Error reading from ADS: {:#}", e));
                ui.notify(Notice::error("Error", format!("Failed to read from ADS:\n{:#}", e)));
            }
        }
    }
}

/// "List Streams" on the ADS Streams tab
pub fn list_streams(toolbox: &mut Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    if let Err(e) = state.validate(false, false) {
        return reject(ui, e);
    }
    state.extract_log.clear();
    state.extract_log.info("Listing streams...");

    let file = state.input_path();
    let Some(exe) = toolbox.locate(tool, ExeRole::Main) else {
        state.extract_log.info(format!("File: {}", file.display()));
        state
            .extract_log
            .info("Note: Install Sysinternals Streams tool for detailed stream listing.");
        state
            .extract_log
            .info("You can manually check streams by trying to read them.");
        return;
    };

    match toolbox.run_logged(&exe, &stego::streams_list(&file), &mut state.extract_log) {
        Ok(output) if output.success() => {
            state.extract_log.success(format!("Listed streams of {}", file.display()));
        }
        Ok(output) => extract_failed(&output, state, ui),
        Err(e) => report_exception(e, &mut state.extract_log, ui),
    }
}

// ============================================
// GUI HAND-OFF
// ============================================

/// "Open <tool>" button, and the hide/extract buttons of GUI-only tools
pub fn launch(toolbox: &mut Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    state.hide_log.clear();
    state.hide_log.info(format!("Opening {} GUI application...", tool.display_name));

    match toolbox.locate(tool, ExeRole::Main) {
        Some(path) => match try_open(tool, &path, state, ui) {
            Ok(()) => return,
            Err(e) => {
                toolbox.forget_if_remembered(tool, ExeRole::Main, &path);
                if !tool.prompt_if_missing {
                    ui.notify(Notice::error(
                        "Error",
                        format!("Failed to open {}:\n{:#}", tool.display_name, e),
                    ));
                    return;
                }
            }
        },
        None if !tool.prompt_if_missing => {
            let text = format!(
                "{} executable not found.\nPlease ensure {} is in the Tools directory.",
                tool.display_name,
                tool.expected_file_name(ExeRole::Main)
            );
            state
                .hide_log
                .error(format!("{} executable not found.", tool.display_name));
            ui.notify(Notice::error("Error", text));
            return;
        }
        None => {}
    }

    state.hide_log.warning(format!(
        "{} executable not found or failed to open. Asking user to locate it...",
        tool.display_name
    ));
    match ui.locate_manually(tool) {
        Some(choice) => {
            if try_open(tool, &choice, state, ui).is_ok() {
                toolbox.remember(tool, ExeRole::Main, choice);
            } else {
                ui.notify(Notice::error(
                    "Error",
                    format!("Failed to open selected file:\n{}", choice.display()),
                ));
            }
        }
        None => ui.notify(Notice::error(
            "Error",
            format!(
                "{} executable not found.\nPlease ensure {} is available on your system.",
                tool.display_name,
                tool.expected_file_name(ExeRole::Main)
            ),
        )),
    }
}

/// Start a GUI tool; the error is already in the log when this fails
fn try_open(tool: &ToolSpec, path: &Path, state: &mut PanelState, ui: &dyn Interaction) -> Result<()> {
    let mut request = LaunchRequest::new(path).shell(tool.shell_launch);
    let input = state.input_path();
    if tool.opens_input_file && !state.input_file.trim().is_empty() && input.exists() {
        request = request.args([input.to_string_lossy().into_owned()]);
    }

    match launcher::launch_detached(&request) {
        Ok(()) => {
            state
                .hide_log
                .success(format!("{} opened successfully: {}", tool.display_name, path.display()));
            let mut text = format!("{} opened!", tool.display_name);
            if !tool.launch_hint.is_empty() {
                text.push('\n');
                text.push_str(tool.launch_hint);
            }
            ui.notify(Notice::info("Success", text));
            Ok(())
        }
        Err(e) => {
            state
                .hide_log
                .error(format!("Error opening {}: {:#}", tool.display_name, e));
            Err(e)
        }
    }
}

/// "Analyze File" (GMER tab): report what we know about the file
pub fn analyze(tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    if let Err(e) = state.validate(false, false) {
        return reject(ui, e);
    }
    state.hide_log.clear();
    state.hide_log.info("Analyzing binary file...");

    let file = state.input_path();
    match fs::metadata(&file) {
        Ok(meta) => {
            state.hide_log.info(format!("File: {}", file.display()));
            state.hide_log.info(format!("Size: {} bytes", meta.len()));
            state.hide_log.success("Analysis complete.");
            state.hide_log.info(format!(
                "Note: Use {} for detailed rootkit and hidden data analysis.",
                tool.display_name
            ));
        }
        Err(e) => report_exception(e.into(), &mut state.hide_log, ui),
    }
}

/// A tool tab became active
pub fn select(toolbox: &mut Toolbox, tool: &ToolSpec, state: &mut PanelState, ui: &dyn Interaction) {
    if tool.auto_launch {
        launch(toolbox, tool, state, ui);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ToolManifest;
    use crate::tools::{
        ADS_STREAMS, DEEPSOUND, GIF_SHUFFLE, GMER, HEX_EDITOR, MP3STEGO, SNOW, STEGHIDE, STOOLS, XIAO,
    };
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeUi {
        notices: RefCell<Vec<Notice>>,
        answer: bool,
        manual_pick: Option<PathBuf>,
        asked_to_locate: RefCell<bool>,
    }

    impl Interaction for FakeUi {
        fn notify(&self, notice: Notice) {
            self.notices.borrow_mut().push(notice);
        }

        fn confirm(&self, _title: &str, _text: &str) -> bool {
            self.answer
        }

        fn locate_manually(&self, _tool: &ToolSpec) -> Option<PathBuf> {
            *self.asked_to_locate.borrow_mut() = true;
            self.manual_pick.clone()
        }
    }

    impl FakeUi {
        fn last(&self) -> Notice {
            self.notices.borrow().last().cloned().expect("a notice")
        }
    }

    fn toolbox(root: &Path) -> Toolbox {
        let locator = Locator::new(vec![root.to_path_buf()], root.join("Tools"), ToolManifest::default());
        Toolbox::new(locator, Settings::default(), None)
    }

    #[test]
    fn output_suggestion_keeps_extension() {
        assert_eq!(suggest_output(Path::new("/pics/cat.png")), PathBuf::from("/pics/cat_stego.png"));
        assert_eq!(suggest_output(Path::new("notes")), PathBuf::from("notes_stego"));
    }

    #[test]
    fn choosing_input_fills_empty_output_only() {
        let mut state = PanelState::default();
        state.set_input(Path::new("/pics/cat.png"));
        assert_eq!(state.output_file, suggest_output(Path::new("/pics/cat.png")).to_string_lossy());

        state.output_file = "/keep/me.png".into();
        state.set_input(Path::new("/pics/dog.png"));
        assert_eq!(state.output_file, "/keep/me.png");
    }

    #[test]
    fn validation_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cover = temp.path().join("cover.jpg");
        fs::write(&cover, b"jpeg").expect("write");

        let mut state = PanelState::default();
        assert_eq!(state.validate(true, true), Err(ValidationError::MissingInput));
        state.input_file = temp.path().join("nope.jpg").to_string_lossy().into_owned();
        assert_eq!(state.validate(true, true), Err(ValidationError::InputNotFound));
        state.input_file = cover.to_string_lossy().into_owned();
        state.message = "   \n".into();
        assert_eq!(state.validate(true, true), Err(ValidationError::MissingMessage));
        assert_eq!(state.validate(false, true), Err(ValidationError::MissingPassword));
        state.password = "pw".into();
        assert_eq!(state.validate(false, true), Ok(()));
    }

    #[test]
    fn rejected_form_runs_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        state.hide_log.info("previous run");
        let ui = FakeUi::default();

        hide(&mut tb, &STEGHIDE, &mut state, &ui);

        assert_eq!(ui.last(), Notice::error("Error", "Please select an input file."));
        assert!(state.hide_log.contains("previous run"));
    }

    #[test]
    fn missing_executable_is_reported() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cover = temp.path().join("cover.jpg");
        fs::write(&cover, b"jpeg").expect("write");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        state.set_input(&cover);
        state.message = "hi".into();
        state.password = "pw".into();
        let ui = FakeUi::default();

        hide(&mut tb, &SNOW, &mut state, &ui);

        assert!(state.hide_log.contains("[ERROR] SNOW executable not found"));
        assert_eq!(ui.last().kind, NoticeKind::Error);
    }

    #[test]
    fn mp3stego_refuses_non_wav_input() {
        let temp = tempfile::tempdir().expect("tempdir");
        let song = temp.path().join("song.mp3");
        fs::write(&song, b"ID3").expect("write");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        state.set_input(&song);
        state.message = "hi".into();
        state.password = "pw".into();
        let ui = FakeUi::default();

        hide(&mut tb, &MP3STEGO, &mut state, &ui);

        assert!(state.hide_log.contains("requires a WAV input file"));
        assert!(ui.last().text.contains("WAV"));
    }

    #[test]
    fn missing_gui_tool_without_prompt_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        let ui = FakeUi::default();

        select(&mut tb, &XIAO, &mut state, &ui);

        assert!(!*ui.asked_to_locate.borrow());
        assert!(state.hide_log.contains("Opening Xiao Steganography GUI application..."));
        assert!(state.hide_log.contains("[ERROR] Xiao Steganography executable not found."));
    }

    #[test]
    fn missing_gui_tool_with_prompt_asks_user() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        let ui = FakeUi::default();

        select(&mut tb, &DEEPSOUND, &mut state, &ui);

        assert!(*ui.asked_to_locate.borrow());
        assert!(ui.last().text.contains("DeepSound executable not found"));
        assert!(tb.settings().remembered.is_empty());
    }

    #[test]
    fn selecting_non_auto_tab_does_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::default();
        let ui = FakeUi::default();

        select(&mut tb, &GMER, &mut state, &ui);

        assert!(ui.notices.borrow().is_empty());
        assert!(state.hide_log.lines().is_empty());
    }

    #[test]
    fn analyze_reports_file_size() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("driver.sys");
        fs::write(&file, [0u8; 42]).expect("write");
        let mut state = PanelState::default();
        state.set_input(&file);
        let ui = FakeUi::default();

        analyze(&GMER, &mut state, &ui);

        assert!(state.hide_log.contains("Size: 42 bytes"));
        assert!(state.hide_log.contains("[SUCCESS] Analysis complete."));
    }

    #[test]
    fn stream_name_is_checked() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("report.txt");
        fs::write(&file, "visible").expect("write");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::new("bad:name");
        state.set_input(&file);
        state.message = "secret".into();
        let ui = FakeUi::default();

        hide(&mut tb, &ADS_STREAMS, &mut state, &ui);
        assert_eq!(ui.last().text, ValidationError::InvalidStreamName.to_string());

        state.stream_name = "  ".into();
        extract(&mut tb, &ADS_STREAMS, &mut state, &ui);
        assert_eq!(ui.last().text, ValidationError::MissingStreamName.to_string());
    }

    #[test]
    fn list_streams_without_helper_logs_guidance() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("report.txt");
        fs::write(&file, "visible").expect("write");
        let mut tb = toolbox(temp.path());
        let mut state = PanelState::new("hidden");
        state.set_input(&file);
        let ui = FakeUi::default();

        list_streams(&mut tb, &ADS_STREAMS, &mut state, &ui);

        assert!(state.extract_log.contains("Install Sysinternals Streams"));
    }

    // ============================================
    // End-to-end runs against shell scripts posing as the real tools
    // ============================================

    #[cfg(unix)]
    mod fake_tools {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        fn install(root: &Path, relative: &str, script: &str) -> PathBuf {
            let path = root.join(relative);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(&path, format!("#!/bin/sh\n{}\n", script)).expect("write script");
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");
            path
        }

        fn leftover_messages(dir: &Path) -> Vec<String> {
            fs::read_dir(dir)
                .expect("read_dir")
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with("stego_msg") || n.starts_with("stego_extract"))
                .collect()
        }

        const FAKE_STEGHIDE: &str = r#"
if [ "$1" = "embed" ]; then
  cp "$3" "$7" && cat "$5" >> "$7"
  exit 0
fi
if [ "$7" = "pw" ]; then
  printf 'the eagle has landed' > "$5"
  exit 0
fi
echo "steghide: could not extract any data with that passphrase!" >&2
exit 1"#;

        #[test]
        fn steghide_hide_writes_output_and_cleans_up() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(temp.path(), "Tools/steghide/steghide.exe", FAKE_STEGHIDE);
            let cover = temp.path().join("cover.jpg");
            fs::write(&cover, "JPEG").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&cover);
            state.message = "  attack at dawn \n".into();
            state.password = "pw".into();
            let ui = FakeUi::default();

            hide(&mut tb, &STEGHIDE, &mut state, &ui);

            let stego_file = temp.path().join("cover_stego.jpg");
            assert_eq!(fs::read_to_string(&stego_file).expect("output"), "JPEGattack at dawn");
            assert!(state.hide_log.contains("Running: "));
            assert!(state.hide_log.contains("-p ****"));
            assert!(state.hide_log.contains("Return code: 0"));
            assert!(state.hide_log.contains("[SUCCESS] Message hidden successfully!"));
            assert_eq!(ui.last().kind, NoticeKind::Info);
            assert!(leftover_messages(temp.path()).is_empty());
        }

        #[test]
        fn steghide_extract_reads_message_file() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(temp.path(), "Tools/steghide/steghide.exe", FAKE_STEGHIDE);
            let stego_file = temp.path().join("cover_stego.jpg");
            fs::write(&stego_file, "JPEG").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&stego_file);
            state.password = "pw".into();
            let ui = FakeUi::default();

            extract(&mut tb, &STEGHIDE, &mut state, &ui);
            assert_eq!(state.extracted, "the eagle has landed");
            assert!(state.extract_log.contains("[SUCCESS] Message extracted successfully!"));
            assert!(leftover_messages(temp.path()).is_empty());

            state.password = "wrong".into();
            state.extracted.clear();
            extract(&mut tb, &STEGHIDE, &mut state, &ui);
            assert_eq!(state.extracted, "");
            assert!(state.extract_log.contains("Return code: 1"));
            assert!(state.extract_log.contains("could not extract any data"));
            assert_eq!(ui.last().kind, NoticeKind::Error);
        }

        #[test]
        fn mp3stego_extract_uses_decoder_and_removes_txt() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(temp.path(), "Tools/MP3Stego/Encode.exe", "exit 0");
            install(
                temp.path(),
                "Tools/MP3Stego/Decode.exe",
                r#"[ "$1" = "-X" ] || exit 2
printf 'from the decoder' > "$4.txt""#,
            );
            let song = temp.path().join("song.mp3");
            fs::write(&song, "ID3").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&song);
            state.password = "pw".into();
            let ui = FakeUi::default();

            extract(&mut tb, &MP3STEGO, &mut state, &ui);

            assert_eq!(state.extracted, "from the decoder");
            assert!(!temp.path().join("song.mp3.txt").exists());
            assert!(state.extract_log.contains("Decode.exe"));
        }

        #[test]
        fn snow_missing_output_lists_causes() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(temp.path(), "Tools/snow.exe", "exit 0");
            let text = temp.path().join("poem.txt");
            fs::write(&text, "roses are red").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&text);
            state.password = "pw".into();
            let ui = FakeUi::default();

            extract(&mut tb, &SNOW, &mut state, &ui);

            assert!(state.extract_log.contains("1. The password is incorrect"));
            assert!(state.extract_log.contains("3. The input file is corrupted or not readable"));
            assert_eq!(ui.last().kind, NoticeKind::Error);
        }

        #[test]
        fn gifshuffle_text_and_binary_output() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/GIFSHUF.EXE",
                r#"if [ "$3" = "pw" ]; then printf 'meet at noon'; else printf '\001\002\003\004\005\006'; fi"#,
            );
            let gif = temp.path().join("anim.gif");
            fs::write(&gif, "GIF89a").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&gif);
            state.password = "pw".into();

            let ui = FakeUi::default();
            extract(&mut tb, &GIF_SHUFFLE, &mut state, &ui);
            assert_eq!(state.extracted, "meet at noon");

            state.password = "bad".into();
            let ui = FakeUi { answer: true, ..FakeUi::default() };
            extract(&mut tb, &GIF_SHUFFLE, &mut state, &ui);
            assert!(state.extract_log.contains("likely wrong password"));
            let raw = temp.path().join(stego::GIFSHUF_RAW_FILE_NAME);
            assert_eq!(fs::read(&raw).expect("raw"), [1u8, 2, 3, 4, 5, 6]);
            assert_eq!(ui.last().title, "Saved");
        }

        #[test]
        fn ads_hide_then_extract() {
            let temp = tempfile::tempdir().expect("tempdir");
            let file = temp.path().join("report.txt");
            fs::write(&file, "visible").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::new("hidden");
            state.set_input(&file);
            state.message = "in the stream".into();
            let ui = FakeUi::default();

            hide(&mut tb, &ADS_STREAMS, &mut state, &ui);
            assert!(state.hide_log.contains("[SUCCESS] Message hidden successfully in stream"));

            extract(&mut tb, &ADS_STREAMS, &mut state, &ui);
            assert_eq!(state.extracted, "in the stream");

            state.stream_name = "missing".into();
            extract(&mut tb, &ADS_STREAMS, &mut state, &ui);
            assert!(state.extract_log.contains("Stream not found"));
        }

        #[test]
        fn manual_pick_is_launched_and_remembered() {
            let temp = tempfile::tempdir().expect("tempdir");
            let picked = install(temp.path(), "elsewhere/DeepSound.exe", "exit 0");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            let ui = FakeUi { manual_pick: Some(picked.clone()), ..FakeUi::default() };

            launch(&mut tb, &DEEPSOUND, &mut state, &ui);

            assert!(state.hide_log.contains("[SUCCESS] DeepSound opened successfully"));
            assert_eq!(
                tb.settings().remembered_path(&DEEPSOUND, ExeRole::Main),
                Some(picked.as_path())
            );

            // Second launch finds the remembered path without asking
            let ui = FakeUi::default();
            launch(&mut tb, &DEEPSOUND, &mut state, &ui);
            assert!(!*ui.asked_to_locate.borrow());
        }

        fn files_starting_with(dir: &Path, prefix: &str) -> Vec<String> {
            fs::read_dir(dir)
                .expect("read_dir")
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with(prefix))
                .collect()
        }

        #[test]
        fn mp3stego_hide_runs_encoder_from_its_folder() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/MP3Stego/Encode.exe",
                r#"test -d tables || { echo "tables not found" >&2; exit 3; }
cp "$2" "$6""#,
            );
            fs::create_dir_all(temp.path().join("Tools/MP3Stego/tables")).expect("tables");
            let song = temp.path().join("song.wav");
            fs::write(&song, "RIFF").expect("write");
            let mp3 = temp.path().join("song.mp3");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&song);
            state.set_output(&mp3);
            state.message = "under the bridge".into();
            state.password = "pw".into();
            let ui = FakeUi::default();

            hide(&mut tb, &MP3STEGO, &mut state, &ui);

            assert_eq!(fs::read_to_string(&mp3).expect("mp3"), "under the bridge");
            assert!(state.hide_log.contains("Return code: 0"));
            assert!(state.hide_log.contains("[SUCCESS] Message hidden successfully!"));
            assert!(leftover_messages(temp.path()).is_empty());
        }

        #[test]
        fn snow_hide_passes_message_file_with_f() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/snow.exe",
                r#"[ "$4" = "-f" ] || exit 2
cp "$6" "$7" && cat "$5" >> "$7""#,
            );
            let poem = temp.path().join("poem.txt");
            fs::write(&poem, "roses are red\n").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&poem);
            state.message = "violets are blue".into();
            state.password = "pw".into();
            let ui = FakeUi::default();

            hide(&mut tb, &SNOW, &mut state, &ui);

            let out = temp.path().join("poem_stego.txt");
            assert_eq!(
                fs::read_to_string(&out).expect("output"),
                "roses are red\nviolets are blue"
            );
            assert!(state.hide_log.contains("-f "));
            assert_eq!(ui.last().kind, NoticeKind::Info);
            assert!(leftover_messages(temp.path()).is_empty());
        }

        #[test]
        fn snow_extract_reports_length_and_empty_message() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/snow.exe",
                r#"if [ "$4" = "empty" ]; then : > "$6"; else printf 'hello' > "$6"; fi"#,
            );
            let poem = temp.path().join("poem_stego.txt");
            fs::write(&poem, "roses are red \t \n").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&poem);
            state.password = "pw".into();
            let ui = FakeUi::default();

            extract(&mut tb, &SNOW, &mut state, &ui);
            assert_eq!(state.extracted, "hello");
            assert!(state
                .extract_log
                .contains("[SUCCESS] Message extracted successfully! Length: 5 characters"));

            state.password = "empty".into();
            extract(&mut tb, &SNOW, &mut state, &ui);
            assert_eq!(state.extracted, "");
            assert!(state.extract_log.contains("Message file is empty."));
            assert_eq!(ui.last(), Notice::info("Info", "No message content found."));
            assert!(files_starting_with(temp.path(), "snow_extracted_msg").is_empty());
        }

        #[test]
        fn gifshuffle_hide_adds_password_only_when_set() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/GIFSHUF.EXE",
                r#"printf '%s|' "$@" > "$(dirname "$0")/args.txt"
for last; do :; done
printf 'GIF89a' > "$last""#,
            );
            let gif = temp.path().join("anim.gif");
            fs::write(&gif, "GIF89a").expect("write");
            let out = temp.path().join("anim_stego.gif");
            let recorded = temp.path().join("Tools/args.txt");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&gif);
            state.message = "meet at noon".into();
            let ui = FakeUi::default();

            hide(&mut tb, &GIF_SHUFFLE, &mut state, &ui);
            assert_eq!(
                fs::read_to_string(&recorded).expect("args"),
                format!("-C|-m|meet at noon|{}|{}|", gif.display(), out.display())
            );
            assert!(out.is_file());

            state.password = "pw".into();
            hide(&mut tb, &GIF_SHUFFLE, &mut state, &ui);
            assert_eq!(
                fs::read_to_string(&recorded).expect("args"),
                format!("-C|-m|meet at noon|-p|pw|{}|{}|", gif.display(), out.display())
            );
            assert!(state.hide_log.contains("[SUCCESS] Message hidden successfully!"));
        }

        #[test]
        fn hex_editor_opens_selected_file() {
            let temp = tempfile::tempdir().expect("tempdir");
            install(
                temp.path(),
                "Tools/HxD/HxD.exe",
                r#"printf '%s' "$1" > "$(dirname "$0")/opened.tmp" && mv "$(dirname "$0")/opened.tmp" "$(dirname "$0")/opened.txt""#,
            );
            let dump = temp.path().join("dump.bin");
            fs::write(&dump, [0u8, 1, 2]).expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            state.set_input(&dump);
            let ui = FakeUi::default();

            launch(&mut tb, &HEX_EDITOR, &mut state, &ui);
            assert!(state.hide_log.contains("[SUCCESS] Hex Editor opened successfully"));

            // The editor runs detached; wait for it to record its argument
            let opened = temp.path().join("Tools/HxD/opened.txt");
            let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
            while !opened.exists() && std::time::Instant::now() < deadline {
                std::thread::sleep(std::time::Duration::from_millis(25));
            }
            assert_eq!(fs::read_to_string(&opened).expect("opened"), dump.to_string_lossy());
        }

        #[test]
        fn found_tool_that_fails_to_start_is_not_reported_missing() {
            let temp = tempfile::tempdir().expect("tempdir");
            // Present but not executable
            fs::write(temp.path().join("S-Tools.exe"), "MZ").expect("write");

            let mut tb = toolbox(temp.path());
            let mut state = PanelState::default();
            let ui = FakeUi::default();

            launch(&mut tb, &STOOLS, &mut state, &ui);

            let notice = ui.last();
            assert_eq!(notice.kind, NoticeKind::Error);
            assert!(notice.text.starts_with("Failed to open S-Tools:\n"), "{}", notice.text);
            assert!(state.hide_log.contains("[ERROR] Error opening S-Tools"));
            assert!(!state.hide_log.contains("executable not found"));
            assert!(!*ui.asked_to_locate.borrow());
        }

        #[test]
        fn remembered_tool_that_fails_to_start_is_forgotten() {
            let temp = tempfile::tempdir().expect("tempdir");
            let stale = temp.path().join("old/S-Tools.exe");
            fs::create_dir_all(stale.parent().expect("parent")).expect("mkdir");
            fs::write(&stale, "MZ").expect("write");
            let settings_path = temp.path().join(crate::settings::SETTINGS_FILE_NAME);

            let mut settings = Settings::default();
            settings.remember(&STOOLS, ExeRole::Main, stale.clone());
            let locator = Locator::new(
                vec![temp.path().to_path_buf()],
                temp.path().join("Tools"),
                ToolManifest::default(),
            );
            let mut tb = Toolbox::new(locator, settings, Some(settings_path.clone()));
            let mut state = PanelState::default();
            let ui = FakeUi::default();

            launch(&mut tb, &STOOLS, &mut state, &ui);

            assert_eq!(tb.settings().remembered_path(&STOOLS, ExeRole::Main), None);
            assert!(Settings::load(&settings_path).remembered.is_empty());
            assert!(ui.last().text.starts_with("Failed to open S-Tools:\n"));
        }
    }
}
