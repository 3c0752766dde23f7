use log::{debug, info, warn};
use regex::Regex;
use std::sync::Arc;
use tokio::time::sleep;

use crate::configuration::types::SessionTiming;
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::SessionError;

/// Install step for the session-sharing daemon. A non-zero exit here is a
/// fatal setup error and is never retried.
const INSTALL_COMMAND: &str = "apt-get update && apt-get install -y tmate curl";

/// Detached daemon launch. The command daemonizes and returns before the
/// session is up, so its immediate exit code is meaningless.
const LAUNCH_COMMAND: &str = "nohup tmate -S /tmp/tmate.sock new-session -d > /tmp/tmate.log 2>&1 &";

/// Status query polled until it prints a connection string.
const DISPLAY_COMMAND: &str = "tmate -S /tmp/tmate.sock display -p '#{tmate_ssh}'";

/// Last-resort combined command: re-issue the session and query it in one
/// shot. Kept distinct from the poll loop since a single combined command
/// can behave differently against the real daemon.
const FALLBACK_COMMAND: &str =
    "tmate -S /tmp/tmate.sock new-session -d; sleep 2; tmate -S /tmp/tmate.sock display -p '#{tmate_ssh}'";

/// Kill issued before a refresh relaunches the daemon.
const KILL_COMMAND: &str = "pkill -f tmate";

/// Marker every valid connection string carries.
const SESSION_MARKER: &str = "tmate.io";

/// Drives the post-create bootstrap inside a running container until a
/// remote-access connection string is available.
///
/// The bootstrapped environment needs time to become ready: the in-container
/// OS gets a settle delay, the daemon gets a start delay, and the status
/// query is polled on a fixed budget with a fixed inter-attempt delay.
pub struct SessionEstablisher {
    engine: Arc<dyn ContainerEngine>,
    timing: SessionTiming,
    session_pattern: Regex,
}

impl SessionEstablisher {
    pub fn new(engine: Arc<dyn ContainerEngine>, timing: SessionTiming) -> Self {
        Self {
            engine,
            timing,
            // e.g. "ssh AbCdEf@nyc1.tmate.io"
            session_pattern: Regex::new(r"ssh\s+\S+@\S*tmate\.io\S*")
                .unwrap_or_else(|e| panic!("invalid session pattern: {}", e)),
        }
    }

    /// Runs the full bootstrap: settle, install, launch, poll.
    ///
    /// Exhausting every poll attempt and the fallback is reported as
    /// [`SessionError::Unavailable`]; the container itself stays usable and
    /// the caller may retry through [`SessionEstablisher::refresh`].
    pub async fn establish(&self, engine_ref: &str) -> Result<String, SessionError> {
        debug!(
            "waiting {:?} for {} to settle",
            self.timing.settle_delay(),
            engine_ref
        );
        sleep(self.timing.settle_delay()).await;

        info!("installing session daemon in {}", engine_ref);
        let install = self.engine.exec(engine_ref, INSTALL_COMMAND).await?;
        if !install.success() {
            return Err(SessionError::InstallFailed(truncated(&install.output)));
        }

        self.launch_and_poll(engine_ref).await
    }

    /// Tears down any existing daemon and runs one launch-and-poll pass.
    ///
    /// The caller decides what to do with the previous connection string;
    /// this function only reports the outcome of the new attempt.
    pub async fn refresh(&self, engine_ref: &str) -> Result<String, SessionError> {
        info!("refreshing session daemon in {}", engine_ref);
        if let Err(e) = self.engine.exec(engine_ref, KILL_COMMAND).await {
            warn!("daemon kill failed in {}: {}", engine_ref, e);
        }
        sleep(self.timing.restart_delay()).await;
        self.launch_and_poll(engine_ref).await
    }

    async fn launch_and_poll(&self, engine_ref: &str) -> Result<String, SessionError> {
        if let Err(e) = self.engine.exec(engine_ref, LAUNCH_COMMAND).await {
            warn!("daemon launch failed in {}: {}", engine_ref, e);
        }
        sleep(self.timing.daemon_start_delay()).await;

        for attempt in 1..=self.timing.poll_attempts {
            match self.engine.exec(engine_ref, DISPLAY_COMMAND).await {
                Ok(result) if result.success() => {
                    if let Some(session) = self.extract_session(&result.output) {
                        info!("session ready for {} on attempt {}", engine_ref, attempt);
                        return Ok(session);
                    }
                    debug!(
                        "status query for {} returned no connection string on attempt {}",
                        engine_ref, attempt
                    );
                }
                Ok(result) => debug!(
                    "status query for {} exited {} on attempt {}",
                    engine_ref, result.exit_code, attempt
                ),
                Err(e) => warn!(
                    "status query for {} failed on attempt {}: {}",
                    engine_ref, attempt, e
                ),
            }
            if attempt < self.timing.poll_attempts {
                sleep(self.timing.poll_delay()).await;
            }
        }

        debug!("poll budget exhausted for {}, trying fallback", engine_ref);
        match self.engine.exec(engine_ref, FALLBACK_COMMAND).await {
            Ok(result) if result.success() => {
                if let Some(session) = self.extract_session(&result.output) {
                    info!("fallback produced a session for {}", engine_ref);
                    return Ok(session);
                }
            }
            Ok(result) => debug!(
                "fallback for {} exited {} without a session",
                engine_ref, result.exit_code
            ),
            Err(e) => warn!("fallback failed for {}: {}", engine_ref, e),
        }

        Err(SessionError::Unavailable)
    }

    fn extract_session(&self, output: &str) -> Option<String> {
        if !output.contains(SESSION_MARKER) {
            return None;
        }
        match self.session_pattern.find(output) {
            Some(found) => Some(found.as_str().to_string()),
            // marker present but in an unexpected shape; keep what we got
            None => Some(output.trim().to_string()),
        }
    }
}

fn truncated(output: &str) -> String {
    const LIMIT: usize = 200;
    if output.len() <= LIMIT {
        output.trim().to_string()
    } else {
        let cut: String = output.chars().take(LIMIT).collect();
        format!("{}...", cut.trim())
    }
}
