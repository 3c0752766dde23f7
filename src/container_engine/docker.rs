use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use tokio::process::Command;

use crate::container_engine::types::{
    CreateSpec, ExecOutput, RunStatus, TaggedContainer, OWNER_LABEL, OWNER_LABEL_VALUE,
};
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::EngineError;

/// CPU quota scheduling period in microseconds. A quota of
/// `cores * CPU_PERIOD_US` gives each instance a hard multiple of one full
/// core's share per period.
const CPU_PERIOD_US: u64 = 100_000;

/// Mount point for the instance's writable storage inside the container.
const STORAGE_MOUNT: &str = "/vps-storage";

/// Keep-alive so the container has a PID 1 that never exits on its own.
const KEEPALIVE_COMMAND: &str = "while true; do sleep 30; done";

/// Container engine adapter backed by the `docker` CLI.
///
/// Every operation shells out through [`tokio::process::Command`]; the
/// engine itself remains the source of truth for container run-status and
/// for the labels the registry reconciles from.
pub struct DockerCli;

impl DockerCli {
    /// Probes the docker daemon and returns the adapter.
    ///
    /// Fails with [`EngineError::RuntimeNotAvailable`] when the CLI is
    /// missing or the daemon does not answer.
    pub async fn new() -> Result<Self, EngineError> {
        let available = Command::new("docker")
            .args(["version", "--format", "{{.Server.Version}}"])
            .output()
            .await
            .map(|output| output.status.success())
            .unwrap_or(false);

        debug!("docker availability check: {}", available);
        if !available {
            return Err(EngineError::RuntimeNotAvailable);
        }
        Ok(Self)
    }

    async fn run_docker(&self, args: &[String]) -> Result<std::process::Output, EngineError> {
        debug!("running docker {:?}", args);
        let output = Command::new("docker").args(args).output().await?;
        Ok(output)
    }

    /// Builds the `docker run` argument list for a create request.
    ///
    /// Separate from the exec path so the argument encoding (limits,
    /// labels, mount) is testable without a daemon.
    pub(crate) fn build_run_args(spec: &CreateSpec) -> Vec<String> {
        let mut args = vec![
            String::from("run"),
            String::from("-d"),
            String::from("--privileged"),
            String::from("--name"),
            spec.name.clone(),
            String::from("--memory"),
            format!("{}g", spec.resources.ram_gb),
            String::from("--cpu-period"),
            CPU_PERIOD_US.to_string(),
            String::from("--cpu-quota"),
            (spec.resources.cpu_cores * CPU_PERIOD_US).to_string(),
            String::from("-v"),
            format!(
                "{}/{}:{}",
                spec.storage_root.display(),
                spec.name,
                STORAGE_MOUNT
            ),
        ];
        let mut labels: Vec<(String, String)> = spec.resources.to_labels().into_iter().collect();
        labels.sort();
        for (key, value) in labels {
            args.push(String::from("--label"));
            args.push(format!("{}={}", key, value));
        }
        args.push(spec.image.clone());
        args.push(String::from("/bin/bash"));
        args.push(String::from("-c"));
        args.push(String::from(KEEPALIVE_COMMAND));
        args
    }

    async fn inspect(&self, engine_ref: &str) -> Result<InspectedContainer, EngineError> {
        let args = vec![
            String::from("inspect"),
            String::from("--format"),
            String::from("{{json .}}"),
            engine_ref.to_string(),
        ];
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed(stderr_message(&output)));
        }
        let raw = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(raw.trim())
            .map_err(|e| EngineError::BadResponse(format!("inspect decode failed: {}", e)))
    }
}

#[async_trait]
impl ContainerEngine for DockerCli {
    async fn create(&self, spec: &CreateSpec) -> Result<String, EngineError> {
        let args = Self::build_run_args(spec);
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed(stderr_message(&output)));
        }
        let engine_ref = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if engine_ref.is_empty() {
            return Err(EngineError::BadResponse(String::from(
                "docker run printed no container id",
            )));
        }
        Ok(engine_ref)
    }

    async fn get_status(&self, engine_ref: &str) -> Result<RunStatus, EngineError> {
        let args = vec![
            String::from("inspect"),
            String::from("--format"),
            String::from("{{.State.Running}}"),
            engine_ref.to_string(),
        ];
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            let message = stderr_message(&output);
            if message.contains("No such object") || message.contains("No such container") {
                return Ok(RunStatus::Absent);
            }
            return Err(EngineError::OperationFailed(message));
        }
        match String::from_utf8_lossy(&output.stdout).trim() {
            "true" => Ok(RunStatus::Running),
            "false" => Ok(RunStatus::Stopped),
            other => Err(EngineError::BadResponse(format!(
                "unexpected run flag: {}",
                other
            ))),
        }
    }

    async fn exec(&self, engine_ref: &str, command: &str) -> Result<ExecOutput, EngineError> {
        let args = vec![
            String::from("exec"),
            engine_ref.to_string(),
            String::from("/bin/sh"),
            String::from("-c"),
            command.to_string(),
        ];
        let output = self.run_docker(&args).await?;
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            output: combined,
        })
    }

    async fn stop(&self, engine_ref: &str) -> Result<(), EngineError> {
        let args = vec![String::from("stop"), engine_ref.to_string()];
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed(stderr_message(&output)));
        }
        Ok(())
    }

    async fn remove(&self, engine_ref: &str) -> Result<(), EngineError> {
        let args = vec![
            String::from("rm"),
            String::from("-f"),
            engine_ref.to_string(),
        ];
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed(stderr_message(&output)));
        }
        Ok(())
    }

    async fn list_tagged(&self) -> Result<Vec<TaggedContainer>, EngineError> {
        let args = vec![
            String::from("ps"),
            String::from("-aq"),
            String::from("--no-trunc"),
            String::from("--filter"),
            format!("label={}={}", OWNER_LABEL, OWNER_LABEL_VALUE),
        ];
        let output = self.run_docker(&args).await?;
        if !output.status.success() {
            return Err(EngineError::OperationFailed(stderr_message(&output)));
        }

        let mut containers = Vec::new();
        for id in String::from_utf8_lossy(&output.stdout).lines() {
            let id = id.trim();
            if id.is_empty() {
                continue;
            }
            // A container may vanish between the listing and the inspect;
            // skip it instead of failing the whole reconciliation.
            match self.inspect(id).await {
                Ok(inspected) => containers.push(inspected.into_tagged(id)),
                Err(e) => warn!("skipping container {} during listing: {}", id, e),
            }
        }
        Ok(containers)
    }
}

fn stderr_message(output: &std::process::Output) -> String {
    let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if message.is_empty() {
        format!("docker exited with {}", output.status)
    } else {
        message
    }
}

#[derive(Debug, Deserialize)]
struct InspectedContainer {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Created")]
    created: Option<String>,
    #[serde(rename = "State")]
    state: InspectedState,
    #[serde(rename = "Config")]
    config: InspectedConfig,
}

#[derive(Debug, Deserialize)]
struct InspectedState {
    #[serde(rename = "Running")]
    running: bool,
}

#[derive(Debug, Deserialize)]
struct InspectedConfig {
    // null for containers created without labels
    #[serde(rename = "Labels")]
    labels: Option<std::collections::HashMap<String, String>>,
}

impl InspectedContainer {
    fn into_tagged(self, engine_ref: &str) -> TaggedContainer {
        let created_at = self
            .created
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|t| t.with_timezone(&Utc));
        TaggedContainer {
            engine_ref: engine_ref.to_string(),
            // docker prefixes names with a slash in inspect output
            name: self.name.trim_start_matches('/').to_string(),
            running: self.state.running,
            labels: self.config.labels.unwrap_or_default(),
            created_at,
        }
    }
}
