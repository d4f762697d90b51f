//! Runtime backends and the availability selector.
//!
//! Two backends can run a session's script: a containerized runtime (the
//! session directory bind-mounted at `/workspace`) and a local interpreter
//! (the session directory as working directory). Probes are re-run on
//! every `select()` call so an image built mid-session is picked up
//! without a restart. Absence is a normal probe outcome, never an error;
//! only `select()` with zero reachable backends produces one.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{ExecError, ExecResult};
use mp_core::RuntimeConfig;

/// Which kind of backend executed (or would execute) a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Containerized runtime
    Container,
    /// Local interpreter
    Local,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Container => write!(f, "container"),
            BackendKind::Local => write!(f, "local"),
        }
    }
}

/// Captured output of one script execution
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// Process exit code (-1 when terminated by signal)
    pub exit_code: i32,
    /// Full captured stdout
    pub stdout: String,
    /// Full captured stderr
    pub stderr: String,
}

impl ScriptOutput {
    /// Whether the process exited zero
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// An execution environment for session scripts.
///
/// Implementations must be Send + Sync for async operation.
#[async_trait]
pub trait RuntimeBackend: Send + Sync {
    /// Backend kind identifier for logging and results
    fn kind(&self) -> BackendKind;

    /// Probe reachability. Bounded latency; absence returns `false`.
    async fn available(&self) -> bool;

    /// Execute `script` (a path relative to `workdir`) inside `workdir`,
    /// capturing stdout/stderr in full regardless of exit status. On
    /// timeout the child is terminated and `Timeout` returned.
    async fn run(
        &self,
        workdir: &Path,
        script: &str,
        timeout: Duration,
    ) -> ExecResult<ScriptOutput>;
}

/// Containerized runtime: scripts run inside an image with the session
/// directory bind-mounted at `/workspace`
pub struct ContainerBackend {
    binary: String,
    image: String,
    probe_timeout: Duration,
}

impl ContainerBackend {
    /// Build from the container section of the runtime config
    pub fn new(binary: &str, image: &str, probe_timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            image: image.to_string(),
            probe_timeout,
        }
    }
}

#[async_trait]
impl RuntimeBackend for ContainerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Container
    }

    async fn available(&self) -> bool {
        // Fast local existence check; never pulls or executes the image
        let probe = Command::new(&self.binary)
            .args(["image", "inspect", &self.image])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        matches!(
            tokio::time::timeout(self.probe_timeout, probe).await,
            Ok(Ok(status)) if status.success()
        )
    }

    async fn run(
        &self,
        workdir: &Path,
        script: &str,
        timeout: Duration,
    ) -> ExecResult<ScriptOutput> {
        // Bind mounts need an absolute host path
        let mount = workdir.canonicalize()?;
        let mut cmd = Command::new(&self.binary);
        cmd.args(["run", "--rm"])
            .arg("-v")
            .arg(format!("{}:/workspace", mount.display()))
            .args(["-w", "/workspace", &self.image, "Rscript", script])
            .kill_on_drop(true);
        run_with_timeout(cmd, timeout).await
    }
}

/// Local interpreter runtime: scripts run with the session directory as
/// the working directory
pub struct LocalBackend {
    binary: String,
    probe_timeout: Duration,
}

impl LocalBackend {
    /// Build from the local section of the runtime config
    pub fn new(binary: &str, probe_timeout: Duration) -> Self {
        Self {
            binary: binary.to_string(),
            probe_timeout,
        }
    }
}

#[async_trait]
impl RuntimeBackend for LocalBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    async fn available(&self) -> bool {
        let probe = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        matches!(
            tokio::time::timeout(self.probe_timeout, probe).await,
            Ok(Ok(status)) if status.success()
        )
    }

    async fn run(
        &self,
        workdir: &Path,
        script: &str,
        timeout: Duration,
    ) -> ExecResult<ScriptOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(script).current_dir(workdir).kill_on_drop(true);
        run_with_timeout(cmd, timeout).await
    }
}

/// Run a prepared command, capturing output, enforcing the job timeout.
/// `kill_on_drop` is what actually terminates the child when the timeout
/// cancels the in-flight future.
async fn run_with_timeout(mut cmd: Command, timeout: Duration) -> ExecResult<ScriptOutput> {
    let output = match tokio::time::timeout(timeout, cmd.output()).await {
        Err(_) => {
            return Err(ExecError::Timeout {
                secs: timeout.as_secs(),
            })
        }
        Ok(result) => result?,
    };

    Ok(ScriptOutput {
        exit_code: output.status.code().unwrap_or(-1),
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Probes backends in a fixed order (container first) on every call
pub struct BackendSelector {
    container: ContainerBackend,
    local: LocalBackend,
}

impl BackendSelector {
    /// Build both backends from the runtime config
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let probe_timeout = Duration::from_secs(config.probe_timeout_secs);
        Self {
            container: ContainerBackend::new(
                &config.container.binary,
                &config.container.image,
                probe_timeout,
            ),
            local: LocalBackend::new(&config.local.binary, probe_timeout),
        }
    }

    /// Pick a reachable backend, re-probing the environment each call.
    ///
    /// Returns `RuntimeUnavailable` when neither probe succeeds; this is
    /// the one place "nothing can run scripts" becomes an error.
    pub async fn select(&self) -> ExecResult<&dyn RuntimeBackend> {
        if self.container.available().await {
            return Ok(&self.container);
        }
        if self.local.available().await {
            return Ok(&self.local);
        }
        Err(ExecError::RuntimeUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MISSING: &str = "metapool-test-definitely-missing-binary";

    #[tokio::test]
    async fn test_absent_binary_probes_false_not_error() {
        let backend = LocalBackend::new(MISSING, Duration::from_secs(2));
        assert!(!backend.available().await);

        let container = ContainerBackend::new(MISSING, "img", Duration::from_secs(2));
        assert!(!container.available().await);
    }

    #[tokio::test]
    async fn test_selector_reports_unavailable() {
        let mut config = RuntimeConfig::default();
        config.container.binary = MISSING.to_string();
        config.local.binary = MISSING.to_string();

        let selector = BackendSelector::from_config(&config);
        assert!(matches!(
            selector.select().await,
            Err(ExecError::RuntimeUnavailable)
        ));
    }

    #[tokio::test]
    async fn test_run_times_out_and_kills_child() {
        let tmp = tempfile::tempdir().unwrap();
        // `sleep 5` stands in for a hung runtime; the script argument is
        // its only operand
        let backend = LocalBackend::new("sleep", Duration::from_secs(2));
        let err = backend
            .run(tmp.path(), "5", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_run_captures_exit_code() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new("false", Duration::from_secs(2));
        let output = backend
            .run(tmp.path(), "ignored", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(!output.success());
        assert_ne!(output.exit_code, 0);
    }
}
