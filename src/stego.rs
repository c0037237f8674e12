// ============================================
// stego.rs - Command lines for the headless tools
// ============================================
// Nothing here hides or finds data itself. Each function builds the exact
// argument list a third-party tool expects; the panel runs it and reads the
// result back from a file or stdout.
//
//   steghide   embed -cf <cover> -ef <msgfile> -sf <out> -p <pass>
//              extract -sf <stego> -xf <msgfile> -p <pass>
//   MP3Stego   Encode -E <msgfile> -P <pass> <in.wav> <out.mp3>
//              Decode -X -P <pass> <in.mp3>        (writes <in.mp3>.txt)
//   SNOW       -C -p <pass> -f <msgfile> <in> <out>
//              -C -Q -p <pass> <in> <msgfile>
//   GIFSHUF    -C -m <message> [-p <pass>] <in> <out>
//              -C [-p <pass>] <in>                 (message on stdout)
//   ADS        plain file I/O on "<file>:<stream>"
// ============================================

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};
use uuid::Uuid;

/// Steghide is quick; anything longer is a prompt we could not answer
pub const STEGHIDE_TIMEOUT: Duration = Duration::from_secs(30);
/// MP3 encoding and the other tools get more room
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Sysinternals streams listing
pub const STREAMS_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw GIF Shuffle output is saved under this name next to the input
pub const GIFSHUF_RAW_FILE_NAME: &str = "gifshuf_raw_output.bin";

/// Arguments plus the settings they need to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub args: Vec<String>,
    /// Run from this folder (MP3Stego and GIFSHUF need their own folder)
    pub cwd: Option<PathBuf>,
    pub timeout: Duration,
}

impl Invocation {
    fn new(args: Vec<String>, timeout: Duration) -> Self {
        Self { args, cwd: None, timeout }
    }

    fn in_dir_of(mut self, exe: &Path) -> Self {
        self.cwd = exe.parent().map(Path::to_path_buf);
        self
    }
}

fn s(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

// ============================================
// STEGHIDE
// ============================================

pub fn steghide_embed(cover: &Path, message_file: &Path, output: &Path, password: &str) -> Invocation {
    Invocation::new(
        vec![
            "embed".into(),
            "-cf".into(),
            s(cover),
            "-ef".into(),
            s(message_file),
            "-sf".into(),
            s(output),
            "-p".into(),
            password.into(),
        ],
        STEGHIDE_TIMEOUT,
    )
}

pub fn steghide_extract(stego: &Path, message_file: &Path, password: &str) -> Invocation {
    Invocation::new(
        vec![
            "extract".into(),
            "-sf".into(),
            s(stego),
            "-xf".into(),
            s(message_file),
            "-p".into(),
            password.into(),
        ],
        STEGHIDE_TIMEOUT,
    )
}

// ============================================
// MP3STEGO
// ============================================

/// MP3Stego compresses WAV to MP3 while embedding, so the input must be WAV
pub fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

/// Encode.exe reads ./tables/, so it runs from its own folder
pub fn mp3stego_encode(
    encoder: &Path,
    message_file: &Path,
    password: &str,
    wav: &Path,
    mp3: &Path,
) -> Invocation {
    Invocation::new(
        vec![
            "-E".into(),
            s(message_file),
            "-P".into(),
            password.into(),
            s(wav),
            s(mp3),
        ],
        DEFAULT_TIMEOUT,
    )
    .in_dir_of(encoder)
}

pub fn mp3stego_decode(decoder: &Path, password: &str, mp3: &Path) -> Invocation {
    Invocation::new(
        vec!["-X".into(), "-P".into(), password.into(), s(mp3)],
        DEFAULT_TIMEOUT,
    )
    .in_dir_of(decoder)
}

/// Decode.exe drops the hidden data next to the input as "<input>.txt"
pub fn mp3stego_output_file(mp3: &Path) -> PathBuf {
    let mut name = mp3.as_os_str().to_os_string();
    name.push(".txt");
    PathBuf::from(name)
}

// ============================================
// SNOW
// ============================================

pub fn snow_conceal(input: &Path, message_file: &Path, output: &Path, password: &str) -> Invocation {
    Invocation::new(
        vec![
            "-C".into(),
            "-p".into(),
            password.into(),
            "-f".into(),
            s(message_file),
            s(input),
            s(output),
        ],
        DEFAULT_TIMEOUT,
    )
}

pub fn snow_extract(input: &Path, message_file: &Path, password: &str) -> Invocation {
    Invocation::new(
        vec![
            "-C".into(),
            "-Q".into(),
            "-p".into(),
            password.into(),
            s(input),
            s(message_file),
        ],
        DEFAULT_TIMEOUT,
    )
}

// ============================================
// GIF SHUFFLE
// ============================================

pub fn gifshuf_conceal(gifshuf: &Path, message: &str, password: &str, input: &Path, output: &Path) -> Invocation {
    let mut args: Vec<String> = vec!["-C".into(), "-m".into(), message.into()];
    if !password.is_empty() {
        args.push("-p".into());
        args.push(password.into());
    }
    args.push(s(input));
    args.push(s(output));
    Invocation::new(args, DEFAULT_TIMEOUT).in_dir_of(gifshuf)
}

pub fn gifshuf_extract(gifshuf: &Path, password: &str, input: &Path) -> Invocation {
    let mut args: Vec<String> = vec!["-C".into()];
    if !password.is_empty() {
        args.push("-p".into());
        args.push(password.into());
    }
    args.push(s(input));
    Invocation::new(args, DEFAULT_TIMEOUT).in_dir_of(gifshuf)
}

/// What GIF Shuffle printed on extract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractedText {
    Empty,
    /// Readable message
    Text(String),
    /// Mostly non-text bytes, usually a wrong password
    Binary,
}

/// Minimum share of printable bytes (tab, CR, LF, 0x20..=0x7E)
const MIN_PRINTABLE_RATIO: f64 = 0.70;
/// Minimum share of letters, digits, spaces and line breaks
const MIN_ALNUM_RATIO: f64 = 0.35;

/// Decide whether decrypted output looks like a message or like noise.
///
/// A wrong GIF Shuffle password still "decrypts" to something; this check
/// keeps that noise out of the message box.
pub fn classify_output(bytes: &[u8]) -> ExtractedText {
    if bytes.is_empty() {
        return ExtractedText::Empty;
    }
    let total = bytes.len() as f64;
    let is_break = |b: u8| matches!(b, 9 | 10 | 13);
    let printable = bytes
        .iter()
        .filter(|&&b| is_break(b) || (32..=126).contains(&b))
        .count() as f64;
    let alnum_space = bytes
        .iter()
        .filter(|&&b| is_break(b) || b.is_ascii_alphanumeric() || b == b' ')
        .count() as f64;

    if printable / total < MIN_PRINTABLE_RATIO || alnum_space / total < MIN_ALNUM_RATIO {
        return ExtractedText::Binary;
    }
    ExtractedText::Text(String::from_utf8_lossy(bytes).into_owned())
}

// ============================================
// ALTERNATE DATA STREAMS
// ============================================

pub const DEFAULT_STREAM_NAME: &str = "hidden";

/// Stream names cannot contain path or stream separators
pub fn is_valid_stream_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(|c| matches!(c, ':' | '\\' | '/'))
}

/// "<file>:<stream>", the path syntax NTFS uses for named streams
pub fn stream_path(file: &Path, stream: &str) -> PathBuf {
    let mut path = file.as_os_str().to_os_string();
    path.push(":");
    path.push(stream);
    PathBuf::from(path)
}

pub fn write_stream(file: &Path, stream: &str, message: &str) -> Result<PathBuf> {
    let path = stream_path(file, stream);
    fs::write(&path, message).with_context(|| format!("Failed to write stream {}", path.display()))?;
    Ok(path)
}

pub fn read_stream(file: &Path, stream: &str) -> Result<String> {
    let path = stream_path(file, stream);
    let bytes = fs::read(&path).with_context(|| format!("Failed to read stream {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Sysinternals: `streams -nobanner -s <file>`
pub fn streams_list(file: &Path) -> Invocation {
    Invocation::new(vec!["-nobanner".into(), "-s".into(), s(file)], STREAMS_TIMEOUT)
}

// ============================================
// TEMPORARY MESSAGE FILES
// ============================================

/// A message file handed to a tool. Removed when dropped.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    /// Reserve a unique file name in `dir` without creating the file
    pub fn reserve(dir: &Path, prefix: &str) -> Self {
        let name = format!("{}_{}.txt", prefix, Uuid::new_v4().simple());
        Self { path: dir.join(name) }
    }

    /// Create the file in `dir` holding `contents`
    pub fn with_contents(dir: &Path, prefix: &str, contents: &str) -> Result<Self> {
        let scratch = Self::reserve(dir, prefix);
        fs::write(&scratch.path, contents)
            .with_context(|| format!("Failed to write message file {}", scratch.path.display()))?;
        debug!(path = %scratch.path.display(), "message file written");
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read whatever the tool wrote, if it wrote anything
    pub fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.path.exists() {
            if let Err(e) = fs::remove_file(&self.path) {
                warn!(path = %self.path.display(), err = %e, "could not remove message file");
            }
        }
    }
}

/// Folder of `path`, or "." for bare file names
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steghide_arguments_match_cli() {
        let inv = steghide_embed(
            Path::new("cover.jpg"),
            Path::new("msg.txt"),
            Path::new("out.jpg"),
            "pw",
        );
        assert_eq!(
            inv.args,
            ["embed", "-cf", "cover.jpg", "-ef", "msg.txt", "-sf", "out.jpg", "-p", "pw"]
        );
        assert_eq!(inv.timeout, STEGHIDE_TIMEOUT);
        assert_eq!(inv.cwd, None);

        let inv = steghide_extract(Path::new("out.jpg"), Path::new("x.txt"), "pw");
        assert_eq!(inv.args, ["extract", "-sf", "out.jpg", "-xf", "x.txt", "-p", "pw"]);
    }

    #[test]
    fn mp3stego_runs_next_to_its_tables() {
        let encoder = Path::new("/kit/Tools/MP3Stego/Encode.exe");
        let inv = mp3stego_encode(
            encoder,
            Path::new("/tmp/msg.txt"),
            "pw",
            Path::new("/music/song.wav"),
            Path::new("/music/song.mp3"),
        );
        assert_eq!(
            inv.args,
            ["-E", "/tmp/msg.txt", "-P", "pw", "/music/song.wav", "/music/song.mp3"]
        );
        assert_eq!(inv.cwd, Some(PathBuf::from("/kit/Tools/MP3Stego")));

        let inv = mp3stego_decode(Path::new("/kit/Tools/MP3Stego/Decode.exe"), "pw", Path::new("/music/song.mp3"));
        assert_eq!(inv.args, ["-X", "-P", "pw", "/music/song.mp3"]);
        assert_eq!(
            mp3stego_output_file(Path::new("/music/song.mp3")),
            PathBuf::from("/music/song.mp3.txt")
        );
    }

    #[test]
    fn wav_check_ignores_case() {
        assert!(is_wav(Path::new("a.WAV")));
        assert!(!is_wav(Path::new("a.mp3")));
        assert!(!is_wav(Path::new("wav")));
    }

    #[test]
    fn snow_arguments() {
        let inv = snow_conceal(Path::new("in.txt"), Path::new("m.txt"), Path::new("out.txt"), "pw");
        assert_eq!(inv.args, ["-C", "-p", "pw", "-f", "m.txt", "in.txt", "out.txt"]);
        let inv = snow_extract(Path::new("out.txt"), Path::new("m.txt"), "pw");
        assert_eq!(inv.args, ["-C", "-Q", "-p", "pw", "out.txt", "m.txt"]);
    }

    #[test]
    fn gifshuf_password_is_optional() {
        let exe = Path::new("/kit/GIFShuff-Tool/GIFSHUF.EXE");
        let inv = gifshuf_conceal(exe, "meet at noon", "", Path::new("a.gif"), Path::new("b.gif"));
        assert_eq!(inv.args, ["-C", "-m", "meet at noon", "a.gif", "b.gif"]);

        let inv = gifshuf_extract(exe, "pw", Path::new("b.gif"));
        assert_eq!(inv.args, ["-C", "-p", "pw", "b.gif"]);
        assert_eq!(inv.cwd, Some(PathBuf::from("/kit/GIFShuff-Tool")));
    }

    #[test]
    fn readable_output_is_text() {
        assert_eq!(
            classify_output(b"meet at noon\r\n"),
            ExtractedText::Text("meet at noon\r\n".into())
        );
        assert_eq!(classify_output(b""), ExtractedText::Empty);
    }

    #[test]
    fn noisy_output_is_binary() {
        let noise: Vec<u8> = (0u8..=255).collect();
        assert_eq!(classify_output(&noise), ExtractedText::Binary);
        // Printable but almost no letters: punctuation soup from a bad key
        assert_eq!(classify_output(b"#$%&'()*+,-./:;<=>?@[]^_`{|}~!"), ExtractedText::Binary);
    }

    #[test]
    fn stream_names() {
        assert!(is_valid_stream_name("hidden"));
        assert!(!is_valid_stream_name(""));
        assert!(!is_valid_stream_name("a:b"));
        assert!(!is_valid_stream_name("..\\x"));
        assert_eq!(
            stream_path(Path::new("C:/docs/report.txt"), "hidden"),
            PathBuf::from("C:/docs/report.txt:hidden")
        );
    }

    // On NTFS this lands in a named stream; elsewhere ':' is just a character
    // in the file name, which is enough to exercise the plumbing.
    #[cfg(unix)]
    #[test]
    fn stream_write_then_read() {
        let temp = tempfile::tempdir().expect("tempdir");
        let file = temp.path().join("report.txt");
        fs::write(&file, "visible").expect("write");

        let written = write_stream(&file, "hidden", "secret").expect("write stream");
        assert_eq!(written, stream_path(&file, "hidden"));
        assert_eq!(read_stream(&file, "hidden").expect("read"), "secret");
        assert!(read_stream(&file, "other").is_err());
    }

    #[test]
    fn scratch_file_is_removed_on_drop() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = {
            let scratch = ScratchFile::with_contents(temp.path(), "stego_msg", "hi").expect("scratch");
            assert_eq!(scratch.read().expect("read"), Some("hi".to_string()));
            scratch.path().to_path_buf()
        };
        assert!(!path.exists());

        let reserved = ScratchFile::reserve(temp.path(), "stego_extract");
        assert_eq!(reserved.read().expect("read"), None);
    }

    #[test]
    fn parent_dir_of_bare_name_is_cwd() {
        assert_eq!(parent_dir(Path::new("song.wav")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("/music/song.wav")), PathBuf::from("/music"));
    }
}
