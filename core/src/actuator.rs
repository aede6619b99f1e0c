//! Smart-plug actuator control
//!
//! Threshold crossings on temperature/humidity writes toggle an external
//! smart plug. The daemon only knows this narrow interface; the production
//! implementation shells out to a configured control script. Invocations are
//! fire-and-forget from the request's point of view: the caller logs a
//! failure and moves on.

use crate::{CoreError, Result};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Logical actuator channel selected by sensor writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugChannel {
    Temperature,
    Humidity,
}

impl PlugChannel {
    /// Short channel argument understood by the control script.
    pub fn arg(&self) -> &'static str {
        match self {
            PlugChannel::Temperature => "temp",
            PlugChannel::Humidity => "hum",
        }
    }
}

/// Abstract plug control the router delegates to
#[async_trait]
pub trait PlugControl: Send + Sync {
    /// Switch the plug behind `channel` on or off.
    async fn set(&self, channel: PlugChannel, on: bool) -> Result<()>;
}

/// Plug control backed by an external script invocation.
///
/// Runs `<interpreter> <script> <channel> <on|off>` and reports a non-zero
/// exit status as an actuator error.
#[derive(Debug, Clone)]
pub struct ScriptPlug {
    interpreter: String,
    script: PathBuf,
}

impl ScriptPlug {
    /// Create a script-backed plug control.
    pub fn new(interpreter: impl Into<String>, script: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            script: script.into(),
        }
    }
}

#[async_trait]
impl PlugControl for ScriptPlug {
    async fn set(&self, channel: PlugChannel, on: bool) -> Result<()> {
        let state = if on { "on" } else { "off" };
        debug!(
            channel = channel.arg(),
            state, "invoking plug control script"
        );

        let status = Command::new(&self.interpreter)
            .arg(&self.script)
            .arg(channel.arg())
            .arg(state)
            .status()
            .await
            .map_err(|e| {
                CoreError::Actuator(format!("failed to run {}: {}", self.interpreter, e))
            })?;

        if !status.success() {
            return Err(CoreError::Actuator(format!(
                "plug script exited with {} for {} {}",
                status,
                channel.arg(),
                state
            )));
        }
        Ok(())
    }
}

/// Discards all commands; stands in where no plug hardware is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPlug;

#[async_trait]
impl PlugControl for NoopPlug {
    async fn set(&self, _channel: PlugChannel, _on: bool) -> Result<()> {
        Ok(())
    }
}
