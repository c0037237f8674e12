// ============================================
// log_panel.rs - Text shown in the Output/Log boxes
// ============================================
// Each tool tab has two logs (Hide and Extract). Lines look like
// "[SUCCESS] Message hidden successfully!" and are mirrored to tracing
// so the console shows the same story.
// ============================================

use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl LogLevel {
    pub fn label(self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One log panel's contents
#[derive(Debug, Clone, Default)]
pub struct LogBuffer {
    lines: Vec<String>,
}

impl LogBuffer {
    pub fn push(&mut self, level: LogLevel, message: impl AsRef<str>) {
        let message = message.as_ref();
        match level {
            LogLevel::Info | LogLevel::Success => info!(level = level.label(), "{}", message),
            LogLevel::Warning => warn!("{}", message),
            LogLevel::Error => error!("{}", message),
        }
        self.lines.push(format!("[{}] {}", level.label(), message));
    }

    pub fn info(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Info, message);
    }

    pub fn success(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Success, message);
    }

    pub fn warning(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Warning, message);
    }

    pub fn error(&mut self, message: impl AsRef<str>) {
        self.push(LogLevel::Error, message);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Panel text, newest line last
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

}

#[cfg(test)]
impl LogBuffer {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }
}
