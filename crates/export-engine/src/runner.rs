//! External transcoder process orchestration.
//!
//! One invocation has exactly two states: running, then exited with a
//! code. Exit 0 resolves the call; anything else (including failure to
//! start) is a terminal error for that invocation. There is no retry
//! and no caller-side cancellation.

use std::path::Path;
use std::process::Stdio;

use matchcut_common::logging::TRANSCODER_LOG_TARGET;
use matchcut_common::{MatchcutError, MatchcutResult};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Number of trailing diagnostic lines included in a failure message.
const ERROR_TAIL_LINES: usize = 12;

/// Run the transcoder with the given argument vector, streaming its
/// diagnostic output to the log sink as it arrives.
pub async fn run_transcoder(executable: &Path, args: &[String]) -> MatchcutResult<()> {
    tracing::debug!(exe = %executable.display(), ?args, "Running transcoder");

    let mut child = Command::new(executable)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            MatchcutError::external_process(
                None,
                format!("failed to start {}: {e}", executable.display()),
            )
        })?;

    // Drain stderr as it arrives so the child never blocks on a full
    // pipe; keep a tail for the failure message. Decoding is lossy:
    // a non-UTF-8 byte must not cut the drain short, or the child can
    // stall on a full pipe and never reach its exit code.
    let stderr = child.stderr.take().ok_or_else(|| {
        MatchcutError::external_process(None, "failed to capture transcoder stderr")
    })?;

    let mut tail: Vec<String> = Vec::new();
    let mut reader = BufReader::new(stderr);
    let mut buf: Vec<u8> = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\r', '\n'])
                    .to_string();
                tracing::debug!(target: TRANSCODER_LOG_TARGET, "{line}");
                if tail.len() == ERROR_TAIL_LINES {
                    tail.remove(0);
                }
                tail.push(line);
            }
            Err(err) => {
                tracing::debug!(
                    target: TRANSCODER_LOG_TARGET,
                    error = %err,
                    "Transcoder stderr closed unexpectedly"
                );
                break;
            }
        }
    }

    let status = child.wait().await.map_err(|e| {
        MatchcutError::external_process(None, format!("failed to wait on transcoder: {e}"))
    })?;

    if status.success() {
        return Ok(());
    }

    Err(MatchcutError::external_process(
        status.code(),
        tail.join("\n").trim().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_executable_fails_immediately() {
        let exe = PathBuf::from("/nonexistent/matchcut/ffmpeg");
        let err = run_transcoder(&exe, &[]).await.unwrap_err();
        match err {
            MatchcutError::ExternalProcess { code, .. } => assert!(code.is_none()),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_zero_exit_resolves() {
        let exe = PathBuf::from("/bin/sh");
        run_transcoder(&exe, &["-c".to_string(), "exit 0".to_string()])
            .await
            .unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_invalid_utf8_line_does_not_drop_later_diagnostics() {
        let exe = PathBuf::from("/bin/sh");
        let err = run_transcoder(
            &exe,
            &[
                "-c".to_string(),
                "printf '\\377\\n' >&2; echo real diagnostic >&2; exit 3".to_string(),
            ],
        )
        .await
        .unwrap_err();
        match err {
            MatchcutError::ExternalProcess { code, message } => {
                assert_eq!(code, Some(3));
                assert!(message.contains("real diagnostic"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drain_keeps_up_with_large_stderr_after_invalid_utf8() {
        // Enough output to overrun the pipe buffer; the wait would block
        // forever if the drain stopped at the bad byte.
        let exe = PathBuf::from("/bin/sh");
        let script = "printf '\\377\\n' >&2; \
                      i=0; while [ $i -lt 4000 ]; do echo \"diagnostic line $i\" >&2; i=$((i+1)); done; \
                      exit 3";
        let err = tokio::time::timeout(
            std::time::Duration::from_secs(30),
            run_transcoder(&exe, &["-c".to_string(), script.to_string()]),
        )
        .await
        .expect("stderr drain stalled")
        .unwrap_err();
        match err {
            MatchcutError::ExternalProcess { code, message } => {
                assert_eq!(code, Some(3));
                assert!(message.contains("diagnostic line 3999"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_surfaces_code_and_diagnostics() {
        let exe = PathBuf::from("/bin/sh");
        let err = run_transcoder(
            &exe,
            &["-c".to_string(), "echo bad input >&2; exit 3".to_string()],
        )
        .await
        .unwrap_err();
        match err {
            MatchcutError::ExternalProcess { code, message } => {
                assert_eq!(code, Some(3));
                assert!(message.contains("bad input"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
