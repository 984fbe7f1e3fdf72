// ─── Game Process ───
// Spawns the JVM, streams its output line by line and cleans up the natives
// directory once it closes.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

use super::natives::NativesDir;

/// Something that happened to a running game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Stdout(String),
    Stderr(String),
    /// Always the last event. Sent after every output line and after the
    /// natives directory has been removed.
    Exited {
        code: Option<i32>,
        signal: Option<i32>,
    },
}

/// Handle to a spawned game.
#[derive(Debug)]
pub struct LaunchHandle {
    pid: Option<u32>,
    events: mpsc::UnboundedReceiver<LaunchEvent>,
    kill_tx: Option<oneshot::Sender<()>>,
}

impl LaunchHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Next event, or `None` once the stream is exhausted.
    pub async fn next_event(&mut self) -> Option<LaunchEvent> {
        self.events.recv().await
    }

    /// Asks the supervisor to kill the game. Returns `false` if a kill was
    /// already requested or the game is gone.
    pub fn kill(&mut self) -> bool {
        match self.kill_tx.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Drains the stream and returns the exit code and signal.
    pub async fn wait(mut self) -> Option<(Option<i32>, Option<i32>)> {
        while let Some(event) = self.events.recv().await {
            if let LaunchEvent::Exited { code, signal } = event {
                return Some((code, signal));
            }
        }
        None
    }
}

/// How to start the game.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    /// Tag for log lines, usually the server id.
    pub label: String,
    pub java: PathBuf,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
    pub detached: bool,
}

/// Starts the game. `natives` and `guard` are held until the process closes;
/// on spawn failure both are dropped before the error is returned.
pub fn spawn_game<G>(request: SpawnRequest, natives: NativesDir, guard: G) -> LauncherResult<LaunchHandle>
where
    G: Send + 'static,
{
    let mut cmd = Command::new(&request.java);
    cmd.args(&request.args)
        .current_dir(&request.working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if request.detached {
        configure_detached(&mut cmd);
    }

    info!("Launching {} with Java: {:?}", request.label, request.java);
    debug!("Command (copy/paste): {}", format_command_for_logs(&request.java, &request.args));

    let mut child = cmd
        .spawn()
        .map_err(|e| LauncherError::JavaExecution(format!("{:?}: {}", request.java, e)))?;
    let pid = child.id();
    info!("{} started with pid {:?}", request.label, pid);

    let (event_tx, events) = mpsc::unbounded_channel();
    let (kill_tx, mut kill_rx) = oneshot::channel();

    let mut readers = Vec::new();
    if let Some(stdout) = child.stdout.take() {
        readers.push(forward_lines(stdout, request.label.clone(), event_tx.clone(), false));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(forward_lines(stderr, request.label.clone(), event_tx.clone(), true));
    }

    let label = request.label;
    tokio::spawn(async move {
        let finished = tokio::select! {
            status = child.wait() => Some(status),
            Ok(()) = &mut kill_rx => None,
        };
        let status = match finished {
            Some(status) => status,
            None => {
                info!("Killing {}", label);
                if let Err(e) = child.start_kill() {
                    warn!("Failed to kill {}: {}", label, e);
                }
                child.wait().await
            }
        };

        for reader in readers {
            let _ = reader.await;
        }

        if let Err(e) = natives.remove().await {
            warn!("Cannot remove natives for {}: {}", label, e);
        }
        drop(guard);

        let (code, signal) = match status {
            Ok(status) => exit_parts(status),
            Err(e) => {
                error!("Failed waiting for {}: {}", label, e);
                (None, None)
            }
        };
        match code {
            Some(0) => info!("{} exited normally", label),
            _ => error!("{} exited with code {:?} (signal {:?})", label, code, signal),
        }
        let _ = event_tx.send(LaunchEvent::Exited { code, signal });
    });

    Ok(LaunchHandle {
        pid,
        events,
        kill_tx: Some(kill_tx),
    })
}

fn forward_lines<R>(
    stream: R,
    label: String,
    tx: mpsc::UnboundedSender<LaunchEvent>,
    is_stderr: bool,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(stream).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let event = if is_stderr {
                warn!("[{}] {}", label, line);
                LaunchEvent::Stderr(line)
            } else {
                info!("[{}] {}", label, line);
                LaunchEvent::Stdout(line)
            };
            let _ = tx.send(event);
        }
    })
}

#[cfg(unix)]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    use std::os::unix::process::ExitStatusExt;
    (status.code(), status.signal())
}

#[cfg(not(unix))]
fn exit_parts(status: ExitStatus) -> (Option<i32>, Option<i32>) {
    (status.code(), None)
}

/// Lets the game outlive the launcher.
fn configure_detached(cmd: &mut Command) {
    #[cfg(unix)]
    {
        cmd.process_group(0);
    }

    #[cfg(target_os = "windows")]
    {
        const DETACHED_PROCESS: u32 = 0x00000008;
        const CREATE_NEW_PROCESS_GROUP: u32 = 0x00000200;
        cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
    }
}

fn format_command_for_logs(program: &Path, args: &[String]) -> String {
    let program = shell_escape(&program.to_string_lossy());
    let args = args
        .iter()
        .map(|arg| shell_escape(arg))
        .collect::<Vec<_>>()
        .join(" ");

    if args.is_empty() {
        program
    } else {
        format!("{} {}", program, args)
    }
}

fn shell_escape(raw: &str) -> String {
    if raw.is_empty() {
        return "\"\"".to_string();
    }

    if raw.chars().all(|ch| {
        ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '/' | ':' | '\\' | '=')
    }) {
        return raw.to_string();
    }

    format!("\"{}\"", raw.replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_log_quotes_only_when_needed() {
        let line = format_command_for_logs(
            Path::new("/usr/bin/java"),
            &["-Xmx4G".into(), "".into(), "--username".into(), "Steve Smith".into()],
        );
        assert_eq!(line, "/usr/bin/java -Xmx4G \"\" --username \"Steve Smith\"");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn streams_output_then_exit_and_removes_natives() {
        let temp = std::env::temp_dir().join(format!("process-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&temp);
        std::fs::create_dir_all(&temp).unwrap();
        let natives = NativesDir::allocate(&temp).unwrap();
        let natives_path = natives.path().to_path_buf();

        let request = SpawnRequest {
            label: "test".into(),
            java: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "echo out; echo err 1>&2; exit 3".into()],
            working_dir: temp.clone(),
            detached: false,
        };
        let mut handle = spawn_game(request, natives, ()).unwrap();
        assert!(handle.pid().is_some());

        let mut events = Vec::new();
        while let Some(event) = handle.next_event().await {
            events.push(event);
        }

        assert!(events.contains(&LaunchEvent::Stdout("out".into())));
        assert!(events.contains(&LaunchEvent::Stderr("err".into())));
        assert_eq!(
            events.last(),
            Some(&LaunchEvent::Exited {
                code: Some(3),
                signal: None
            })
        );
        assert!(!natives_path.exists());

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_terminates_the_game() {
        let temp = std::env::temp_dir().join(format!("process-kill-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&temp);
        std::fs::create_dir_all(&temp).unwrap();
        let natives = NativesDir::allocate(&temp).unwrap();

        let request = SpawnRequest {
            label: "test".into(),
            java: PathBuf::from("/bin/sh"),
            args: vec!["-c".into(), "exec sleep 30".into()],
            working_dir: temp.clone(),
            detached: true,
        };
        let mut handle = spawn_game(request, natives, ()).unwrap();
        assert!(handle.kill());
        assert!(!handle.kill());

        let (code, signal) = handle.wait().await.unwrap();
        assert_eq!(code, None);
        assert_eq!(signal, Some(9));

        let _ = std::fs::remove_dir_all(&temp);
    }

    #[tokio::test]
    async fn spawn_failure_removes_natives() {
        let temp = std::env::temp_dir().join(format!("process-fail-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&temp);
        std::fs::create_dir_all(&temp).unwrap();
        let natives = NativesDir::allocate(&temp).unwrap();
        let natives_path = natives.path().to_path_buf();

        let request = SpawnRequest {
            label: "test".into(),
            java: temp.join("no-such-java"),
            args: vec![],
            working_dir: temp.clone(),
            detached: false,
        };
        let err = spawn_game(request, natives, ()).unwrap_err();
        assert!(matches!(err, LauncherError::JavaExecution(_)));
        assert!(!natives_path.exists());

        let _ = std::fs::remove_dir_all(&temp);
    }
}
