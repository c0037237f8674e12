// ============================================
// locator.rs - Finding tool executables on disk
// ============================================
// Lookup order for a tool:
//   1. A path the user picked earlier (settings.json), if it still exists
//   2. The tool's built-in candidate list, then tools.toml extras
//      (each relative candidate is tried against every search root)
//   3. PATH, for bare names like "steghide"
//   4. A shallow scan of the Tools folder for any candidate file name
//
// The file dialog fallback lives in dialogs.rs; this module never blocks
// on the user.
// ============================================

use std::env;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use crate::settings::{Settings, ToolManifest};
use crate::tools::{ExeRole, ToolSpec};

/// How deep the Tools folder scan goes (Tools/<vendor>/<version>/bin/x.exe)
const SCAN_DEPTH: usize = 4;

/// Return the first candidate that exists as a file.
///
/// Absolute candidates are checked as-is. Relative candidates are joined to
/// each root in order. Candidate order wins over root order.
pub fn find_executable<P: AsRef<Path>>(candidates: &[P], roots: &[PathBuf]) -> Option<PathBuf> {
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if candidate.as_os_str().is_empty() {
            continue;
        }
        if candidate.is_absolute() {
            if candidate.is_file() {
                return Some(candidate.to_path_buf());
            }
            continue;
        }
        for root in roots {
            let full = root.join(candidate);
            if full.is_file() {
                return Some(full);
            }
        }
    }
    None
}

/// Is this a bare program name (no directory part)?
fn is_bare_name(candidate: &str) -> bool {
    !candidate.contains('/') && !candidate.contains('\\')
}

/// Look a bare program name up on PATH
pub fn search_path(name: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    search_dirs(name, env::split_paths(&path_var))
}

fn search_dirs(name: &str, dirs: impl IntoIterator<Item = PathBuf>) -> Option<PathBuf> {
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|full| full.is_file())
}

/// Scan `dir` for a file whose name matches one of `file_names` (ignoring case)
pub fn scan_tools_dir(dir: &Path, file_names: &[&str]) -> Option<PathBuf> {
    if !dir.is_dir() || file_names.is_empty() {
        return None;
    }
    let wanted: Vec<String> = file_names.iter().map(|n| n.to_lowercase()).collect();

    WalkDir::new(dir)
        .max_depth(SCAN_DEPTH)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| {
            entry
                .file_name()
                .to_str()
                .map(|name| wanted.contains(&name.to_lowercase()))
                .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
}

/// Resolves tools against the app directory, the working directory and the
/// Tools folder
#[derive(Debug, Clone)]
pub struct Locator {
    roots: Vec<PathBuf>,
    tools_dir: PathBuf,
    manifest: ToolManifest,
}

impl Locator {
    pub fn new(roots: Vec<PathBuf>, tools_dir: PathBuf, manifest: ToolManifest) -> Self {
        let mut unique: Vec<PathBuf> = Vec::with_capacity(roots.len());
        for root in roots {
            if !unique.contains(&root) {
                unique.push(root);
            }
        }
        Self { roots: unique, tools_dir, manifest }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn tools_dir(&self) -> &Path {
        &self.tools_dir
    }

    /// Find the executable for `tool` in the given role
    pub fn locate(&self, tool: &ToolSpec, role: ExeRole, settings: &Settings) -> Option<PathBuf> {
        if let Some(path) = settings.remembered_path(tool, role) {
            if path.is_file() {
                debug!(tool = tool.id, path = %path.display(), "using remembered executable");
                return Some(path.to_path_buf());
            }
            info!(tool = tool.id, path = %path.display(), "remembered executable is gone");
        }

        let builtin = tool.candidates_for(role);
        if let Some(found) = find_executable(builtin, &self.roots) {
            debug!(tool = tool.id, path = %found.display(), "found executable");
            return Some(found);
        }

        let extra = self.manifest.extra_candidates(tool, role);
        if let Some(found) = find_executable(&extra, &self.roots) {
            debug!(tool = tool.id, path = %found.display(), "found executable from tools.toml");
            return Some(found);
        }

        for name in builtin.iter().filter(|c| is_bare_name(c)) {
            if let Some(found) = search_path(name) {
                debug!(tool = tool.id, path = %found.display(), "found executable on PATH");
                return Some(found);
            }
        }

        let file_names: Vec<&str> = builtin
            .iter()
            .filter_map(|c| Path::new(c).file_name().and_then(OsStr::to_str))
            .collect();
        let scanned = scan_tools_dir(&self.tools_dir, &file_names);
        match &scanned {
            Some(found) => debug!(tool = tool.id, path = %found.display(), "found executable in Tools scan"),
            None => info!(tool = tool.id, role = ?role, "executable not found"),
        }
        scanned
    }
}
