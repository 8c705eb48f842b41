//! Engine transport layer
//!
//! A transport sends one GMP command document and returns the raw response.
//! The production transport spawns the engine's CLI per exchange; tests
//! substitute scripted transports through the same trait.

use crate::core::config::EngineConfig;
use crate::engine::error::{EngineError, EngineResult};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

#[async_trait]
pub trait EngineTransport: Send + Sync {
    /// Send one command document to the engine and return its raw response
    async fn exchange(&self, command: &str) -> EngineResult<String>;
}

/// Transport that shells out to a GMP CLI talking to the engine daemon over
/// a unix socket
#[derive(Debug, Clone)]
pub struct GvmCliTransport {
    cli_path: PathBuf,
    socket_path: PathBuf,
    username: String,
    password: String,
}

impl GvmCliTransport {
    pub fn new(
        cli_path: impl Into<PathBuf>,
        socket_path: impl Into<PathBuf>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            cli_path: cli_path.into(),
            socket_path: socket_path.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(
            &config.cli_path,
            &config.socket_path,
            &config.username,
            &config.password,
        )
    }
}

#[async_trait]
impl EngineTransport for GvmCliTransport {
    async fn exchange(&self, command: &str) -> EngineResult<String> {
        log::trace!("engine exchange: {}", command);

        let output = Command::new(&self.cli_path)
            .arg("--gmp-username")
            .arg(&self.username)
            .arg("--gmp-password")
            .arg(&self.password)
            .arg("socket")
            .arg("--socketpath")
            .arg(&self.socket_path)
            .arg("--xml")
            .arg(command)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| EngineError::Transport {
                message: format!("failed to spawn '{}': {}", self.cli_path.display(), e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(EngineError::Transport { message: stderr });
        }

        String::from_utf8(output.stdout).map_err(|e| EngineError::Protocol {
            message: format!("engine response is not valid UTF-8: {}", e),
        })
    }
}
