// ============================================
// tools.rs - The catalog of third-party stego tools
// ============================================
//
// This module handles:
//   - Tool definitions (name, mode, candidate paths, file filters)
//   - Grouping tools into the six categories shown on the main window
//   - Working out where the app and its Tools folder live
//
// PORTABLE DESIGN:
// Tools are expected in a Tools folder NEXT TO the launcher EXE:
//
//   Stego Kit/
//   ├── stego-launcher.exe
//   ├── settings.json          # remembered executable locations
//   ├── tools.toml             # optional extra candidate paths
//   └── Tools/
//       ├── steghide/
//       │   └── steghide.exe
//       ├── MP3Stego/
//       │   ├── Encode.exe
//       │   ├── Decode.exe
//       │   └── tables/
//       ├── GIFShuff-Tool/
//       │   └── GIFSHUF.EXE
//       └── DeepSound.exe
//
// Candidate paths are relative to the app directory (or the current
// working directory); absolute candidates are checked as-is.
// ============================================

use std::path::PathBuf;

use tracing::warn;

// ============================================
// TOOL MODES
// ============================================

/// Tools that we drive from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlessKind {
    Steghide,
    Mp3Stego,
    Snow,
    GifShuffle,
    /// NTFS alternate data streams, written through `file:stream` paths.
    /// The executable (Sysinternals streams) is only used for listing.
    AdsStream,
}

/// How a tool's tab behaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolMode {
    /// Hide/Extract form that shells out with tool-specific flags
    Headless(HeadlessKind),
    /// Bare launch button, the tool's own GUI does the work
    Gui,
}

/// Which executable of a tool we are looking for.
/// Only MP3Stego ships a separate extractor (Decode.exe).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExeRole {
    Main,
    Extract,
}

impl ExeRole {
    /// Key suffix used when remembering a user-picked path
    pub fn key_suffix(self) -> &'static str {
        match self {
            ExeRole::Main => "",
            ExeRole::Extract => ":extract",
        }
    }
}

/// A file dialog filter, e.g. ("Image files", ["jpg", "png"])
#[derive(Debug, Clone, Copy)]
pub struct FileFilter {
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

// ============================================
// TOOL DEFINITION
// ============================================

/// Information about one third-party tool
#[derive(Debug, Clone)]
pub struct ToolSpec {
    /// Unique ID (e.g., "steghide", "deepsound")
    pub id: &'static str,
    /// Display name for the tab
    pub display_name: &'static str,
    /// Description for the launch panel
    pub description: &'static str,
    pub mode: ToolMode,
    /// Ordered candidate paths, first existing one wins
    pub candidates: &'static [&'static str],
    /// Candidates for the extractor, empty when the main EXE does both
    pub extract_candidates: &'static [&'static str],
    pub input_filters: &'static [FileFilter],
    pub output_filters: &'static [FileFilter],
    /// Launch as soon as the tab is selected
    pub auto_launch: bool,
    /// Ask the user to locate the EXE when the candidates miss
    pub prompt_if_missing: bool,
    /// Hand the EXE to the OS shell instead of spawning it directly
    pub shell_launch: bool,
    /// Pass the selected input file as the first argument
    pub opens_input_file: bool,
    /// Offer the "Analyze File" action
    pub can_analyze: bool,
    pub needs_password: bool,
    /// Shown after a successful GUI hand-off
    pub launch_hint: &'static str,
}

impl ToolSpec {
    pub fn is_headless(&self) -> bool {
        matches!(self.mode, ToolMode::Headless(_))
    }

    pub fn candidates_for(&self, role: ExeRole) -> &'static [&'static str] {
        match role {
            ExeRole::Extract if !self.extract_candidates.is_empty() => self.extract_candidates,
            _ => self.candidates,
        }
    }

    /// File name users should drop into Tools/, taken from the first candidate
    pub fn expected_file_name(&self, role: ExeRole) -> &'static str {
        self.candidates_for(role)
            .first()
            .map(|c| c.rsplit(|ch| ch == '/' || ch == '\\').next().unwrap_or(c))
            .unwrap_or(self.display_name)
    }

    /// Does the hide operation write an output file?
    pub fn has_output_file(&self) -> bool {
        matches!(
            self.mode,
            ToolMode::Headless(
                HeadlessKind::Steghide
                    | HeadlessKind::Mp3Stego
                    | HeadlessKind::Snow
                    | HeadlessKind::GifShuffle
            )
        )
    }

    pub fn uses_password(&self) -> bool {
        self.is_headless() && self.mode != ToolMode::Headless(HeadlessKind::AdsStream)
    }
}

// ============================================
// FILE FILTERS
// ============================================

const ALL_FILES: FileFilter = FileFilter { name: "All files", extensions: &["*"] };

const IMAGE_FILES: &[FileFilter] = &[
    FileFilter { name: "Image files", extensions: &["jpg", "jpeg", "png", "bmp", "gif"] },
    ALL_FILES,
];
const WAV_FILES: &[FileFilter] = &[FileFilter { name: "WAV files", extensions: &["wav"] }, ALL_FILES];
const MP3_FILES: &[FileFilter] = &[FileFilter { name: "MP3 files", extensions: &["mp3"] }, ALL_FILES];
const AUDIO_FILES: &[FileFilter] = &[
    FileFilter { name: "Audio files", extensions: &["wav", "mp3", "flac"] },
    ALL_FILES,
];
const GIF_FILES: &[FileFilter] = &[FileFilter { name: "GIF files", extensions: &["gif"] }, ALL_FILES];
const TEXT_FILES: &[FileFilter] = &[
    FileFilter { name: "Text files", extensions: &["txt", "html", "xml"] },
    ALL_FILES,
];
const STOOLS_FILES: &[FileFilter] = &[
    FileFilter { name: "Image files", extensions: &["bmp", "gif"] },
    FileFilter { name: "Audio files", extensions: &["wav"] },
    ALL_FILES,
];
const BINARY_FILES: &[FileFilter] = &[
    FileFilter { name: "Binary files", extensions: &["bin", "exe", "dll", "dat"] },
    ALL_FILES,
];
const EXECUTABLE_FILES: &[FileFilter] = &[
    FileFilter { name: "Executable files", extensions: &["exe", "dll", "sys"] },
    ALL_FILES,
];
const ANY_FILE: &[FileFilter] = &[ALL_FILES];

// ============================================
// TOOL DEFINITIONS
// ============================================

/// Steghide - JPEG/BMP/WAV/AU embedding from the command line
pub const STEGHIDE: ToolSpec = ToolSpec {
    id: "steghide",
    display_name: "Steghide",
    description: "Hide a message in an image with a passphrase.",
    mode: ToolMode::Headless(HeadlessKind::Steghide),
    candidates: &[
        "Tools/steghide/steghide.exe",
        "tools/steghide/steghide.exe",
        "Tools/steghide.exe",
        "steghide.exe",
        "steghide",
    ],
    extract_candidates: &[],
    input_filters: IMAGE_FILES,
    output_filters: IMAGE_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: true,
    launch_hint: "",
};

/// Xiao Steganography - GUI only, usually installed with a shortcut
pub const XIAO: ToolSpec = ToolSpec {
    id: "xiao",
    display_name: "Xiao Steganography",
    description: "Hide files inside BMP and WAV carriers using the Xiao GUI.",
    mode: ToolMode::Gui,
    candidates: &[
        "Xiao Stenography.lnk",
        "Tools/Xiao Stenography.lnk",
        "tools/Xiao Stenography.lnk",
        "Tools/XiaoSteganography.exe",
        "Tools/Xiao.exe",
        "XiaoSteganography.exe",
        "Xiao.exe",
    ],
    extract_candidates: &[],
    input_filters: IMAGE_FILES,
    output_filters: IMAGE_FILES,
    auto_launch: true,
    prompt_if_missing: false,
    shell_launch: true,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the application to hide or extract your message.",
};

/// MP3Stego - hides data while compressing WAV to MP3
pub const MP3STEGO: ToolSpec = ToolSpec {
    id: "mp3stego",
    display_name: "MP3Stego",
    description: "Embed a message while encoding WAV to MP3.",
    mode: ToolMode::Headless(HeadlessKind::Mp3Stego),
    candidates: &[
        "Tools/MP3Stego/Encode.exe",
        "tools/MP3Stego/Encode.exe",
        "Tools/Encode.exe",
        "Encode.exe",
        "mp3stego.exe",
    ],
    extract_candidates: &[
        "Tools/MP3Stego/Decode.exe",
        "tools/MP3Stego/Decode.exe",
        "Tools/Decode.exe",
        "Decode.exe",
    ],
    input_filters: WAV_FILES,
    output_filters: MP3_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: true,
    launch_hint: "",
};

/// DeepSound - GUI audio steganography
pub const DEEPSOUND: ToolSpec = ToolSpec {
    id: "deepsound",
    display_name: "DeepSound",
    description: "Hide files in WAV/FLAC audio with the DeepSound GUI.",
    mode: ToolMode::Gui,
    candidates: &[
        "Tools/DeepSound.exe",
        "tools/DeepSound.exe",
        "Tools/DeepSound/DeepSound.exe",
        "DeepSound.exe",
        "deepsound.exe",
    ],
    extract_candidates: &[],
    input_filters: AUDIO_FILES,
    output_filters: AUDIO_FILES,
    auto_launch: true,
    prompt_if_missing: true,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the application to hide or extract your message.",
};

/// GIF Shuffle - encodes data in the order of a GIF's colour map
pub const GIF_SHUFFLE: ToolSpec = ToolSpec {
    id: "gifshuffle",
    display_name: "GIF Shuffle Tool",
    description: "Hide a short message in the colour map order of a GIF.",
    mode: ToolMode::Headless(HeadlessKind::GifShuffle),
    candidates: &[
        "tools/GIFShuff-Tool/GIFSHUF.EXE",
        "Tools/GIFShuff-Tool/GIFSHUF.EXE",
        "Tools/GIFShuff-Tool/GIFSHUF.exe",
        "Tools/GIFSHUF.EXE",
        "GIFSHUF.EXE",
        "GIFSHUF.exe",
        "gifshuf.exe",
        "gifshuffle",
    ],
    extract_candidates: &[],
    input_filters: GIF_FILES,
    output_filters: GIF_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "",
};

/// DeEgger Embedder - GUI embedder for video and image carriers
pub const DEEGGER: ToolSpec = ToolSpec {
    id: "deegger",
    display_name: "DeEgger Embedder",
    description: "Launch the DeEgger Embedder GUI application.",
    mode: ToolMode::Gui,
    candidates: &[
        "DeEgger Embedder.lnk",
        "DeEgger Embedder.exe",
        "DeEgger Embedder.exe.lnk",
        "Tools/DeEgger Embedder.exe",
        "Tools/DeEgger Embedder.lnk",
        "tools/DeEgger Embedder.exe",
        "tools/DeEgger Embedder.lnk",
        "Tools/DeEgger Embedder/DeEgger Embedder.exe",
        "deegger.exe",
    ],
    extract_candidates: &[],
    input_filters: ANY_FILE,
    output_filters: ANY_FILE,
    auto_launch: true,
    prompt_if_missing: true,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the application to hide or extract messages.",
};

/// SNOW - whitespace steganography for text files
pub const SNOW: ToolSpec = ToolSpec {
    id: "snow",
    display_name: "SNOW",
    description: "Conceal a message in trailing whitespace of a text file.",
    mode: ToolMode::Headless(HeadlessKind::Snow),
    candidates: &[
        "snow.exe",
        "tools/snow.exe",
        "Tools/snow.exe",
        "Tools/SNOW/snow.exe",
        "snow",
    ],
    extract_candidates: &[],
    input_filters: TEXT_FILES,
    output_filters: TEXT_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: true,
    launch_hint: "",
};

/// wbStego4open - GUI for BMP, text, HTML and PDF carriers
pub const WBSTEGO: ToolSpec = ToolSpec {
    id: "wbstego",
    display_name: "WBStego4open",
    description: "Hide data in BMP, text, HTML and PDF files with wbStego4open.",
    mode: ToolMode::Gui,
    candidates: &[
        "Tools/wbStego4open/wbStego4open.exe",
        "tools/wbStego4open/wbStego4open.exe",
        "Tools/wbStego4open.exe",
        "Tools/wbStego4.3open.exe",
        "wbStego4open.exe",
        "wbStego4.3open.exe",
    ],
    extract_candidates: &[],
    input_filters: ANY_FILE,
    output_filters: ANY_FILE,
    auto_launch: false,
    prompt_if_missing: true,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the application to hide or extract your message.",
};

/// S-Tools 4 - classic BMP/GIF/WAV GUI
pub const STOOLS: ToolSpec = ToolSpec {
    id: "stools",
    display_name: "S-Tools",
    description: "Drag-and-drop hiding in BMP, GIF and WAV files with S-Tools 4.",
    mode: ToolMode::Gui,
    candidates: &[
        "Tools/S-Tools/s-tools4/S-Tools.exe",
        "tools/S-Tools/s-tools4/S-Tools.exe",
        "S-Tools.exe",
        "s-tools.exe",
    ],
    extract_candidates: &[],
    input_filters: STOOLS_FILES,
    output_filters: STOOLS_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the application to hide or extract your message.",
};

/// ADS Viewer - browse and edit NTFS alternate data streams
pub const ADS_VIEWER: ToolSpec = ToolSpec {
    id: "adsviewer",
    display_name: "ADS Viewer",
    description: "View all streams in a file, create or delete streams and view their contents.",
    mode: ToolMode::Gui,
    candidates: &[
        "D:/ADSView.exe",
        "Tools/ADSViewer.exe",
        "tools/ADSViewer.exe",
        "Tools/ADS Viewer.exe",
        "Tools/ADSViewer/ADSViewer.exe",
        "ADSViewer.exe",
        "ADSView.exe",
    ],
    extract_candidates: &[],
    input_filters: ANY_FILE,
    output_filters: ANY_FILE,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "",
};

/// Direct ADS access; Sysinternals streams is only needed for listing
pub const ADS_STREAMS: ToolSpec = ToolSpec {
    id: "streams",
    display_name: "Streams",
    description: "Write a message to, or read it from, a named stream of a file.",
    mode: ToolMode::Headless(HeadlessKind::AdsStream),
    candidates: &[
        "Tools/streams.exe",
        "tools/streams.exe",
        "Tools/Streams/streams64.exe",
        "streams.exe",
        "streams64.exe",
    ],
    extract_candidates: &[],
    input_filters: ANY_FILE,
    output_filters: ANY_FILE,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: false,
    can_analyze: false,
    needs_password: false,
    launch_hint: "",
};

/// Hex editor (HxD or Hex Editor Neo) for manual byte-level hiding
pub const HEX_EDITOR: ToolSpec = ToolSpec {
    id: "hexeditor",
    display_name: "Hex Editor",
    description: "Open the carrier in HxD or Hex Editor Neo and edit the bytes by hand.",
    mode: ToolMode::Gui,
    candidates: &[
        "Tools/HxD/HxD.exe",
        "Tools/HxD.exe",
        "HxD.exe",
        "hexeditor.exe",
        "HexEditorNeo.exe",
        "Tools/HexEditorNeo.exe",
        "C:/Program Files/HxD/HxD.exe",
    ],
    extract_candidates: &[],
    input_filters: BINARY_FILES,
    output_filters: BINARY_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: false,
    opens_input_file: true,
    can_analyze: false,
    needs_password: false,
    launch_hint: "Use the hex editor to hide or extract the message by hand.",
};

/// GMER - rootkit scanner, used here to look for hidden data
pub const GMER: ToolSpec = ToolSpec {
    id: "gmer",
    display_name: "GMER",
    description: "Security analysis tool. Use it to look for hidden processes, files and streams.",
    mode: ToolMode::Gui,
    candidates: &["Tools/gmer.exe", "tools/gmer.exe", "gmer.exe", "GMER.exe"],
    extract_candidates: &[],
    input_filters: EXECUTABLE_FILES,
    output_filters: EXECUTABLE_FILES,
    auto_launch: false,
    prompt_if_missing: false,
    shell_launch: true,
    opens_input_file: false,
    can_analyze: true,
    needs_password: false,
    launch_hint: "Use GMER for detailed binary analysis and hidden data extraction.",
};

// ============================================
// CATEGORIES
// ============================================

/// A card on the main window; opens one window with a tab per tool
#[derive(Debug)]
pub struct Category {
    pub id: &'static str,
    pub title: &'static str,
    pub tools: &'static [&'static ToolSpec],
}

impl Category {
    /// Tool names, one per line, for the card on the main window
    pub fn blurb(&self) -> String {
        self.tools
            .iter()
            .map(|t| t.display_name)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

static CATEGORIES: [Category; 6] = [
    Category { id: "image", title: "Image Steganography", tools: &[&STEGHIDE, &XIAO] },
    Category { id: "audio", title: "Audio Steganography", tools: &[&MP3STEGO, &DEEPSOUND] },
    Category { id: "video", title: "Video/GIF Steganography", tools: &[&GIF_SHUFFLE, &DEEGGER] },
    Category { id: "text", title: "Text Steganography", tools: &[&SNOW, &WBSTEGO, &STOOLS] },
    Category { id: "ads", title: "ADS Tools", tools: &[&ADS_VIEWER, &ADS_STREAMS] },
    Category { id: "hex", title: "Hex/Binary Steganography", tools: &[&HEX_EDITOR, &GMER] },
];

/// All categories, in main-window order
pub fn categories() -> &'static [Category] {
    &CATEGORIES
}

pub fn category_by_id(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Get a tool by its ID, across all categories
pub fn tool_by_id(id: &str) -> Option<&'static ToolSpec> {
    CATEGORIES
        .iter()
        .flat_map(|c| c.tools.iter().copied())
        .find(|t| t.id == id)
}

// ============================================
// PATH HELPERS
// ============================================

/// Get the directory where the launcher EXE is located.
///
/// Candidate paths are resolved against this directory first, so the kit
/// works from a USB stick regardless of the current working directory.
pub fn get_app_directory() -> PathBuf {
    let exe_dir = std::env::current_exe().ok().and_then(|exe| {
        let resolved = exe.canonicalize().unwrap_or(exe);
        resolved.parent().map(without_verbatim_prefix)
    });
    match exe_dir {
        Some(dir) => dir,
        None => {
            warn!("could not determine EXE directory, using current directory");
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        }
    }
}

/// Verbatim paths (\\?\C:\...) break candidate joins and read badly in logs
fn without_verbatim_prefix(path: &std::path::Path) -> PathBuf {
    let text = path.to_string_lossy();
    match text.strip_prefix(r"\\?\") {
        Some(plain) => PathBuf::from(plain),
        None => path.to_path_buf(),
    }
}

/// Default Tools folder: `Tools/` next to the EXE, `tools/` if only that exists
pub fn default_tools_directory(app_dir: &std::path::Path) -> PathBuf {
    let upper = app_dir.join("Tools");
    if upper.is_dir() {
        return upper;
    }
    let lower = app_dir.join("tools");
    if lower.is_dir() {
        return lower;
    }
    upper
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn tool_ids_are_unique_and_every_tool_has_candidates() {
        let mut seen = HashSet::new();
        for category in categories() {
            assert!(!category.tools.is_empty(), "{} has no tools", category.id);
            for tool in category.tools {
                assert!(seen.insert(tool.id), "duplicate tool id {}", tool.id);
                assert!(!tool.candidates.is_empty(), "{} has no candidates", tool.id);
            }
        }
    }

    #[test]
    fn categories_keep_main_window_order() {
        let ids: Vec<_> = categories().iter().map(|c| c.id).collect();
        assert_eq!(ids, ["image", "audio", "video", "text", "ads", "hex"]);
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(tool_by_id("snow").map(|t| t.display_name), Some("SNOW"));
        assert!(tool_by_id("hideitpro").is_none());
        assert_eq!(category_by_id("audio").map(|c| c.tools.len()), Some(2));
    }

    #[test]
    fn mp3stego_uses_decoder_for_extract() {
        assert_eq!(MP3STEGO.expected_file_name(ExeRole::Main), "Encode.exe");
        assert_eq!(MP3STEGO.expected_file_name(ExeRole::Extract), "Decode.exe");
        // Tools without a separate extractor fall back to the main list
        assert_eq!(STEGHIDE.candidates_for(ExeRole::Extract), STEGHIDE.candidates);
    }

    #[test]
    fn auto_launch_tabs_are_gui_tools() {
        for tool in categories().iter().flat_map(|c| c.tools.iter()) {
            if tool.auto_launch {
                assert_eq!(tool.mode, ToolMode::Gui, "{}", tool.id);
            }
        }
    }

    #[test]
    fn verbatim_prefix_is_dropped() {
        assert_eq!(
            without_verbatim_prefix(std::path::Path::new(r"\\?\C:\Stego Kit")),
            PathBuf::from(r"C:\Stego Kit")
        );
        assert_eq!(
            without_verbatim_prefix(std::path::Path::new("/opt/stego")),
            PathBuf::from("/opt/stego")
        );
    }

    #[test]
    fn ads_streams_has_no_password_or_output() {
        assert!(!ADS_STREAMS.uses_password());
        assert!(!ADS_STREAMS.has_output_file());
        assert!(GIF_SHUFFLE.uses_password());
        assert!(!GIF_SHUFFLE.needs_password);
    }
}
