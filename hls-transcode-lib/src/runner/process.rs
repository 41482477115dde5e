use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

use super::{Invocation, ToolError, ToolOutput, ToolRunner};

/// Runs tools as child processes.
///
/// Each child is started in its own process group. If the wait does not
/// finish normally (timeout, wait error, or the future being dropped because
/// the client went away) the whole group is killed.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

/// Kills the child's process group on drop unless disarmed.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_group(pgid);
        }
    }
}

#[cfg(unix)]
fn kill_group(pgid: u32) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    debug!(pgid, "killing process group");
    match killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
        Ok(()) | Err(nix::errno::Errno::ESRCH) => {}
        Err(e) => warn!(pgid, "failed to kill process group: {}", e),
    }
}

#[cfg(not(unix))]
fn kill_group(_pgid: u32) {}

fn program_name(invocation: &Invocation) -> String {
    invocation
        .program
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| invocation.program.to_string_lossy().to_string())
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        let program = program_name(invocation);

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| ToolError::Spawn {
            program: program.clone(),
            source,
        })?;

        // The child leads its own group, so its pid is the pgid.
        let guard = GroupGuard::new(child.id());

        match tokio::time::timeout(invocation.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                guard.disarm();
                Ok(ToolOutput {
                    success: output.status.success(),
                    exit_code: output.status.code(),
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
            Ok(Err(source)) => Err(ToolError::Io { program, source }),
            Err(_elapsed) => {
                warn!("{} timed out after {:?}", program, invocation.timeout);
                Err(ToolError::Timeout {
                    program,
                    timeout: invocation.timeout,
                })
            }
        }
    }
}
