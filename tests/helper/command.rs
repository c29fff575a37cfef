//! Command runner test utilities

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use port_status::inventory::command::{CommandError, CommandRunner};

pub const VERSION_COMMAND: &str = "port version";
pub const INSTALLED_COMMAND: &str = "port installed requested and active";

/// Command runner returning canned output per command line
pub struct ScriptedRunner {
    outputs: Mutex<HashMap<String, Result<String, i32>>>,
    calls: AtomicUsize,
}

impl ScriptedRunner {
    pub fn new(version_output: &str, installed_output: &str) -> Self {
        let runner = Self {
            outputs: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        };
        runner.set_output(VERSION_COMMAND, version_output);
        runner.set_output(INSTALLED_COMMAND, installed_output);
        runner
    }

    pub fn set_output(&self, command: &str, output: &str) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), Ok(output.to_string()));
    }

    pub fn set_failure(&self, command: &str, code: i32) {
        self.outputs
            .lock()
            .unwrap()
            .insert(command.to_string(), Err(code));
    }

    /// Number of listing runs so far (one per reconciliation)
    pub fn listing_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command_line: &str) -> Result<String, CommandError> {
        if command_line == INSTALLED_COMMAND {
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
        let outcome = self.outputs.lock().unwrap().get(command_line).cloned();
        match outcome {
            Some(Ok(output)) => Ok(output),
            Some(Err(code)) => Err(CommandError::NonZeroExit {
                command: command_line.to_string(),
                code: Some(code),
            }),
            None => Err(CommandError::NonZeroExit {
                command: command_line.to_string(),
                code: Some(127),
            }),
        }
    }
}
