use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::{Invocation, ToolError, ToolOutput, ToolRunner};

/// Outcome of one scripted run.
#[derive(Debug, Clone)]
pub enum ScriptedStep {
    Output(ToolOutput),
    Timeout,
    SpawnFailure,
}

impl ScriptedStep {
    /// Successful run printing `stdout`.
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        ScriptedStep::Output(ToolOutput {
            success: true,
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        })
    }

    /// Failed run printing `stderr`.
    pub fn fail(stderr: impl Into<Vec<u8>>) -> Self {
        ScriptedStep::Output(ToolOutput {
            success: false,
            exit_code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.into(),
        })
    }
}

type Hook = Box<dyn Fn(&Invocation) + Send + Sync>;

/// Test double for [`ToolRunner`].
///
/// Records every invocation and answers with queued steps, falling back to a
/// default step once the queue is drained.
pub struct ScriptedRunner {
    queue: Mutex<VecDeque<ScriptedStep>>,
    default: ScriptedStep,
    calls: Mutex<Vec<Invocation>>,
    hook: Option<Hook>,
    delay: Option<Duration>,
}

impl ScriptedRunner {
    pub fn new(default: ScriptedStep) -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            default,
            calls: Mutex::new(Vec::new()),
            hook: None,
            delay: None,
        }
    }

    /// Queue a step to be returned before the default.
    pub fn push(&self, step: ScriptedStep) -> &Self {
        self.queue.lock().push_back(step);
        self
    }

    /// Call `hook` while the tool is "running".
    pub fn with_hook(mut self, hook: impl Fn(&Invocation) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    /// Sleep for `delay` on every run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All invocations so far.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ToolOutput, ToolError> {
        self.calls.lock().push(invocation.clone());
        if let Some(hook) = &self.hook {
            hook(invocation);
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let step = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default.clone());
        let program = invocation.program.to_string_lossy().to_string();
        match step {
            ScriptedStep::Output(output) => Ok(output),
            ScriptedStep::Timeout => Err(ToolError::Timeout {
                program,
                timeout: invocation.timeout,
            }),
            ScriptedStep::SpawnFailure => Err(ToolError::Spawn {
                program,
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            }),
        }
    }
}
