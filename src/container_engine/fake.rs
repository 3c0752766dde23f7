//! Scripted in-memory engine used across the crate's tests.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::container_engine::types::{CreateSpec, ExecOutput, RunStatus, TaggedContainer};
use crate::container_engine::ContainerEngine;
use crate::error_handling::types::EngineError;

#[derive(Debug, Clone)]
struct FakeContainer {
    running: bool,
}

#[derive(Debug, Default)]
struct FakeState {
    next_ref: u32,
    containers: HashMap<String, FakeContainer>,
    tagged: Vec<TaggedContainer>,
    fail_create: Option<String>,
    fail_status: bool,
    fail_remove: bool,
    install_exit: i32,
    display_results: VecDeque<ExecOutput>,
    fallback_result: Option<ExecOutput>,
    exec_log: Vec<String>,
    remove_calls: Vec<String>,
    stop_calls: Vec<String>,
}

/// Engine double with scripted responses and call recording.
///
/// Exec commands are classified by substring, mirroring the bootstrap
/// sequence: an install command (`apt-get install`), a detached launch
/// (`new-session` without a display query), the display poll, the combined
/// fallback (`new-session` plus display in one shot) and the refresh kill
/// (`pkill`).
pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                install_exit: 0,
                ..FakeState::default()
            }),
        }
    }

    /// Preloads the tagged-container listing used by reconciliation; the
    /// listed containers also answer status queries.
    pub fn with_tagged(tagged: Vec<TaggedContainer>) -> Self {
        let engine = Self::new();
        {
            let mut state = engine.state.lock().unwrap();
            for container in &tagged {
                state.containers.insert(
                    container.engine_ref.clone(),
                    FakeContainer {
                        running: container.running,
                    },
                );
            }
            state.tagged = tagged;
        }
        engine
    }

    pub fn set_fail_create(&self, message: &str) {
        self.state.lock().unwrap().fail_create = Some(message.to_string());
    }

    pub fn set_fail_status(&self, fail: bool) {
        self.state.lock().unwrap().fail_status = fail;
    }

    pub fn set_fail_remove(&self, fail: bool) {
        self.state.lock().unwrap().fail_remove = fail;
    }

    pub fn set_install_exit(&self, exit_code: i32) {
        self.state.lock().unwrap().install_exit = exit_code;
    }

    /// Queues the result of the next display poll; polls beyond the queue
    /// report exit 1 with empty output.
    pub fn push_display(&self, exit_code: i32, output: &str) {
        self.state
            .lock()
            .unwrap()
            .display_results
            .push_back(ExecOutput {
                exit_code,
                output: output.to_string(),
            });
    }

    pub fn set_fallback(&self, exit_code: i32, output: &str) {
        self.state.lock().unwrap().fallback_result = Some(ExecOutput {
            exit_code,
            output: output.to_string(),
        });
    }

    pub fn exec_log(&self) -> Vec<String> {
        self.state.lock().unwrap().exec_log.clone()
    }

    /// Number of plain display polls issued (the fallback's combined
    /// command is counted separately).
    pub fn display_poll_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .exec_log
            .iter()
            .filter(|cmd| cmd.contains("display") && !cmd.contains("new-session"))
            .count()
    }

    pub fn remove_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().remove_calls.clone()
    }

    pub fn stop_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().stop_calls.clone()
    }
}

#[async_trait]
impl ContainerEngine for FakeEngine {
    async fn create(&self, spec: &CreateSpec) -> Result<String, EngineError> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.fail_create {
            return Err(EngineError::OperationFailed(message.clone()));
        }
        state.next_ref += 1;
        let engine_ref = format!("fake-{}-{}", spec.name, state.next_ref);
        state
            .containers
            .insert(engine_ref.clone(), FakeContainer { running: true });
        Ok(engine_ref)
    }

    async fn get_status(&self, engine_ref: &str) -> Result<RunStatus, EngineError> {
        let state = self.state.lock().unwrap();
        if state.fail_status {
            return Err(EngineError::OperationFailed(String::from(
                "status query refused",
            )));
        }
        match state.containers.get(engine_ref) {
            Some(container) if container.running => Ok(RunStatus::Running),
            Some(_) => Ok(RunStatus::Stopped),
            None => Ok(RunStatus::Absent),
        }
    }

    async fn exec(&self, _engine_ref: &str, command: &str) -> Result<ExecOutput, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.exec_log.push(command.to_string());

        if command.contains("apt-get install") {
            return Ok(ExecOutput {
                exit_code: state.install_exit,
                output: if state.install_exit == 0 {
                    String::from("installed")
                } else {
                    String::from("E: unable to fetch archives")
                },
            });
        }
        if command.contains("display") && command.contains("new-session") {
            return Ok(state.fallback_result.clone().unwrap_or(ExecOutput {
                exit_code: 1,
                output: String::new(),
            }));
        }
        if command.contains("display") {
            return Ok(state.display_results.pop_front().unwrap_or(ExecOutput {
                exit_code: 1,
                output: String::new(),
            }));
        }
        // daemon launch, pkill and anything else succeed silently
        Ok(ExecOutput {
            exit_code: 0,
            output: String::new(),
        })
    }

    async fn stop(&self, engine_ref: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.stop_calls.push(engine_ref.to_string());
        match state.containers.get_mut(engine_ref) {
            Some(container) => {
                container.running = false;
                Ok(())
            }
            None => Err(EngineError::OperationFailed(String::from(
                "no such container",
            ))),
        }
    }

    async fn remove(&self, engine_ref: &str) -> Result<(), EngineError> {
        let mut state = self.state.lock().unwrap();
        state.remove_calls.push(engine_ref.to_string());
        if state.fail_remove {
            return Err(EngineError::OperationFailed(String::from(
                "removal refused",
            )));
        }
        state.containers.remove(engine_ref);
        Ok(())
    }

    async fn list_tagged(&self) -> Result<Vec<TaggedContainer>, EngineError> {
        Ok(self.state.lock().unwrap().tagged.clone())
    }
}
