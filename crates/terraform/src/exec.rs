//! Running Terraform subcommands.
//!
//! Children are spawned with `kill_on_drop`, so dropping the future (the
//! coordinator's execution timeout does exactly that) terminates the process.

use std::collections::VecDeque;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use vmm_domain::{Error, Result};

/// Lines of stderr kept for the error message of a failed step.
const STDERR_TAIL: usize = 20;

fn command(bin: &str, dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(bin);
    cmd.args(args)
        .current_dir(dir)
        .env("TF_IN_AUTOMATION", "1")
        .stdin(Stdio::null())
        .kill_on_drop(true);
    cmd
}

/// Run `bin args...` in `dir`, streaming its output to the log. A non-zero
/// exit is a `Provisioning` error for `step` carrying the tail of stderr.
pub async fn run(bin: &str, dir: &Path, step: &'static str, args: &[&str]) -> Result<()> {
    let mut child = command(bin, dir, args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::provisioning(step, format!("failed to spawn {bin}: {e}")))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_task = async {
        if let Some(stdout) = stdout {
            let mut lines = BufReader::new(stdout).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::debug!(step, "{line}");
            }
        }
    };
    let stderr_task = async {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL);
        if let Some(stderr) = stderr {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                tracing::warn!(step, "{line}");
                if tail.len() == STDERR_TAIL {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
        tail
    };

    let (status, _, tail) = tokio::join!(child.wait(), stdout_task, stderr_task);
    let status = status.map_err(|e| Error::provisioning(step, format!("waiting for {bin}: {e}")))?;

    if status.success() {
        return Ok(());
    }
    let tail: Vec<String> = tail.into();
    Err(Error::provisioning(
        step,
        format!("{bin} exited with {status}: {}", tail.join("\n")),
    ))
}

/// Run `bin args...` in `dir` and return its stdout.
pub async fn capture(bin: &str, dir: &Path, step: &'static str, args: &[&str]) -> Result<Vec<u8>> {
    let output = command(bin, dir, args)
        .output()
        .await
        .map_err(|e| Error::provisioning(step, format!("failed to spawn {bin}: {e}")))?;

    if !output.status.success() {
        return Err(Error::provisioning(
            step,
            format!(
                "{bin} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }
    Ok(output.stdout)
}
