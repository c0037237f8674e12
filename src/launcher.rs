// ============================================
// launcher.rs - Starting external tools
// ============================================
// Two ways to start a tool:
//
//   launch_detached()  GUI hand-off. We start the process and forget it.
//                      Shortcuts (.lnk) go through the Windows shell,
//                      which is the only thing that knows how to follow
//                      them.
//
//   run_captured()     Command-line tools. We wait for the exit code and
//                      collect stdout/stderr for the log panel. Tools that
//                      hang are killed after a timeout.
// ============================================

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use tracing::{debug, error, info, warn};
use wait_timeout::ChildExt;

/// What to start and how
#[derive(Debug, Clone, Default)]
pub struct LaunchRequest {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Defaults to the executable's own folder
    pub cwd: Option<PathBuf>,
    /// Open through the OS shell (ShellExecute on Windows)
    pub shell: bool,
}

impl LaunchRequest {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self { program: program.into(), ..Self::default() }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Working directory: explicit cwd, else the program's folder
    fn working_dir(&self) -> Option<PathBuf> {
        self.cwd
            .clone()
            .or_else(|| self.program.parent().map(Path::to_path_buf))
            .filter(|dir| !dir.as_os_str().is_empty())
    }
}

/// Exit status and output of a finished command-line tool
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Is this a Windows shortcut file?
pub fn is_shortcut(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("lnk"))
        .unwrap_or(false)
}

/// Build the "Running: ..." line for the log. Passwords are masked.
pub fn render_command(program: &Path, args: &[String]) -> String {
    let mut parts = vec![quote(&program.to_string_lossy())];
    let mut mask_next = false;
    for arg in args {
        if mask_next {
            parts.push("****".to_string());
            mask_next = false;
            continue;
        }
        mask_next = arg == "-p" || arg == "-P";
        parts.push(quote(arg));
    }
    parts.join(" ")
}

fn quote(arg: &str) -> String {
    if arg.is_empty() || arg.contains(' ') {
        format!("\"{}\"", arg)
    } else {
        arg.to_string()
    }
}

// ============================================
// GUI HAND-OFF
// ============================================

/// Start a tool and return as soon as it is running.
pub fn launch_detached(request: &LaunchRequest) -> Result<()> {
    info!(program = %request.program.display(), shell = request.shell, "launching");

    if request.shell || is_shortcut(&request.program) {
        return shell_open(request);
    }

    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args);
    if let Some(dir) = request.working_dir() {
        cmd.current_dir(dir);
    }
    cmd.spawn()
        .with_context(|| format!("Failed to launch {}", request.program.display()))?;
    Ok(())
}

/// Open a file through ShellExecuteW, which follows .lnk shortcuts and
/// honours elevation manifests (GMER asks for admin rights).
#[cfg(windows)]
fn shell_open(request: &LaunchRequest) -> Result<()> {
    use std::ffi::OsStr;
    use std::os::windows::ffi::OsStrExt;
    use std::ptr;
    use winapi::um::shellapi::ShellExecuteW;
    use winapi::um::winuser::SW_SHOWNORMAL;

    fn wide(s: &OsStr) -> Vec<u16> {
        s.encode_wide().chain(std::iter::once(0)).collect()
    }

    let verb = wide(OsStr::new("open"));
    let file = wide(request.program.as_os_str());
    // Shortcuts carry their own arguments
    let params = if is_shortcut(&request.program) || request.args.is_empty() {
        None
    } else {
        let joined: Vec<String> = request.args.iter().map(|a| quote(a)).collect();
        Some(wide(OsStr::new(&joined.join(" "))))
    };
    let dir = request.working_dir().map(|d| wide(d.as_os_str()));

    // SAFETY: every pointer refers to a NUL-terminated buffer that outlives the call
    let code = unsafe {
        ShellExecuteW(
            ptr::null_mut(),
            verb.as_ptr(),
            file.as_ptr(),
            params.as_ref().map_or(ptr::null(), |p| p.as_ptr()),
            dir.as_ref().map_or(ptr::null(), |d| d.as_ptr()),
            SW_SHOWNORMAL,
        )
    } as isize;

    // Values above 32 mean success
    if code <= 32 {
        bail!(
            "Windows could not open {} (ShellExecute error {})",
            request.program.display(),
            code
        );
    }
    Ok(())
}

#[cfg(not(windows))]
fn shell_open(request: &LaunchRequest) -> Result<()> {
    if is_shortcut(&request.program) {
        bail!(
            "Shortcut files can only be opened on Windows: {}",
            request.program.display()
        );
    }
    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args);
    if let Some(dir) = request.working_dir() {
        cmd.current_dir(dir);
    }
    cmd.spawn()
        .with_context(|| format!("Failed to launch {}", request.program.display()))?;
    Ok(())
}

// ============================================
// COMMAND-LINE TOOLS
// ============================================

/// How long to keep collecting output once the tool is dead.
/// Helpers a tool forked may still hold the pipes open.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// Run a tool to completion, capturing stdout/stderr.
///
/// Stdin is closed so tools that prompt (steghide asks before overwriting)
/// fail fast instead of hanging. Output is pumped through a channel while we
/// wait, so a chatty tool cannot fill the pipe and deadlock, and a helper
/// process that outlives the tool cannot stretch the wait past `timeout`.
pub fn run_captured(request: &LaunchRequest, timeout: Duration) -> Result<CommandOutput> {
    let mut cmd = Command::new(&request.program);
    cmd.args(&request.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(dir) = request.working_dir() {
        cmd.current_dir(dir);
    }

    debug!(program = %request.program.display(), timeout_secs = timeout.as_secs(), "spawning tool");
    let started = Instant::now();
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => {
            error!(err = %e, program = %request.program.display(), "failed to spawn tool");
            return Err(e).with_context(|| format!("Failed to run {}", request.program.display()));
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;
    let (tx, rx) = mpsc::channel();
    pump(stdout, Stream::Stdout, tx.clone());
    pump(stderr, Stream::Stderr, tx);

    let mut timed_out = false;
    let status = match child.wait_timeout(timeout).context("wait for tool")? {
        Some(status) => status,
        None => {
            warn!(timeout_secs = timeout.as_secs(), "tool timed out, killing");
            timed_out = true;
            child.kill().context("kill tool")?;
            child.wait().context("wait for tool after kill")?
        }
    };

    // A tool that exited on its own keeps the rest of its time budget
    let grace_end = Instant::now() + DRAIN_GRACE;
    let drain_until = if timed_out {
        grace_end
    } else {
        (started + timeout).max(grace_end)
    };
    let (stdout, stderr) = drain(&rx, drain_until);

    debug!(exit_code = ?status.code(), timed_out, "tool finished");
    Ok(CommandOutput {
        exit_code: status.code(),
        stdout,
        stderr,
        timed_out,
    })
}

/// Forward everything `reader` produces until EOF
fn pump<R: Read + Send + 'static>(mut reader: R, stream: Stream, tx: Sender<(Stream, Vec<u8>)>) {
    thread::spawn(move || {
        let mut buf = [0u8; 8192];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send((stream, buf[..n].to_vec())).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(?stream, err = %e, "output pipe read failed");
                    break;
                }
            }
        }
    });
}

/// Collect output until both pipes close or `until` passes
fn drain(rx: &Receiver<(Stream, Vec<u8>)>, until: Instant) -> (Vec<u8>, Vec<u8>) {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    loop {
        let left = until.saturating_duration_since(Instant::now());
        match rx.recv_timeout(left) {
            Ok((Stream::Stdout, bytes)) => stdout.extend_from_slice(&bytes),
            Ok((Stream::Stderr, bytes)) => stderr.extend_from_slice(&bytes),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                warn!("output pipes still held open by another process, not waiting for them");
                break;
            }
        }
    }
    (stdout, stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcut_detection_ignores_case() {
        assert!(is_shortcut(Path::new("Tools/Xiao Stenography.lnk")));
        assert!(is_shortcut(Path::new("C:/Tools/DEEGGER.LNK")));
        assert!(!is_shortcut(Path::new("Tools/Xiao.exe")));
        assert!(!is_shortcut(Path::new("lnk")));
    }

    #[test]
    fn rendered_command_masks_passwords_and_quotes_spaces() {
        let args: Vec<String> = ["embed", "-cf", "my photo.jpg", "-p", "hunter2"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            render_command(Path::new("Tools/steghide/steghide.exe"), &args),
            "Tools/steghide/steghide.exe embed -cf \"my photo.jpg\" -p ****"
        );

        let args: Vec<String> = ["-X", "-P", "secret", "song.mp3"].into_iter().map(String::from).collect();
        assert_eq!(render_command(Path::new("Decode.exe"), &args), "Decode.exe -X -P **** song.mp3");
    }

    #[test]
    fn working_dir_defaults_to_program_folder() {
        let request = LaunchRequest::new("Tools/MP3Stego/Encode.exe");
        assert_eq!(request.working_dir(), Some(PathBuf::from("Tools/MP3Stego")));

        let bare = LaunchRequest::new("steghide");
        assert_eq!(bare.working_dir(), None);

        let explicit = LaunchRequest::new("steghide").cwd("/tmp");
        assert_eq!(explicit.working_dir(), Some(PathBuf::from("/tmp")));
    }

    #[cfg(unix)]
    #[test]
    fn captures_exit_code_and_both_streams() {
        let request = LaunchRequest::new("/bin/sh").args(["-c", "echo out; echo err >&2; exit 3"]);
        let output = run_captured(&request, Duration::from_secs(10)).expect("run");

        assert_eq!(output.exit_code, Some(3));
        assert!(!output.success());
        assert!(!output.timed_out);
        assert_eq!(output.stdout_text(), "out\n");
        assert_eq!(output.stderr_text(), "err\n");
    }

    #[cfg(unix)]
    #[test]
    fn runs_in_requested_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::write(temp.path().join("tables"), b"x").expect("write");
        let request = LaunchRequest::new("/bin/sh")
            .args(["-c", "test -f tables"])
            .cwd(temp.path());
        let output = run_captured(&request, Duration::from_secs(10)).expect("run");
        assert!(output.success());
    }

    #[cfg(unix)]
    #[test]
    fn hung_tool_is_killed_after_timeout() {
        let request = LaunchRequest::new("/bin/sh").args(["-c", "exec sleep 30"]);
        let output = run_captured(&request, Duration::from_millis(200)).expect("run");
        assert!(output.timed_out);
        assert!(!output.success());
    }

    // sh forks `sleep` here; killing sh leaves sleep holding the pipes
    #[cfg(unix)]
    #[test]
    fn timeout_is_not_extended_by_forked_helpers() {
        let request = LaunchRequest::new("/bin/sh").args(["-c", "sleep 5; true"]);
        let started = Instant::now();
        let output = run_captured(&request, Duration::from_millis(200)).expect("run");
        assert!(output.timed_out);
        assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    }

    #[cfg(unix)]
    #[test]
    fn background_helper_does_not_block_finished_tool() {
        let request = LaunchRequest::new("/bin/sh").args(["-c", "echo done; sleep 5 &"]);
        let started = Instant::now();
        let output = run_captured(&request, Duration::from_secs(1)).expect("run");
        assert!(!output.timed_out);
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.stdout_text(), "done\n");
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    }

    #[test]
    fn missing_program_is_an_error() {
        let request = LaunchRequest::new("/definitely/not/here/steghide.exe");
        assert!(run_captured(&request, Duration::from_secs(1)).is_err());
        assert!(launch_detached(&request).is_err());
    }

    #[cfg(not(windows))]
    #[test]
    fn shortcuts_need_windows() {
        let err = launch_detached(&LaunchRequest::new("Tools/Xiao Stenography.lnk"))
            .expect_err("shortcut");
        assert!(err.to_string().contains("only be opened on Windows"));
    }
}
