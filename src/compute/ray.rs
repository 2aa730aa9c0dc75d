// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ray-hosted runtime reached through `docker exec` on the head container.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;

use crate::error::BringupError;
use crate::exec::{CommandRunner, CommandSpec};

use super::{RemoteRuntime, RuntimeInventory, ServeOutcome, ServeParams};

const SERVE_PATTERN: &str = "vllm serve";

pub struct RayRuntime {
    runner: Arc<dyn CommandRunner>,
    container: String,
    log_path: String,
}

impl RayRuntime {
    pub fn new(runner: Arc<dyn CommandRunner>, container: impl Into<String>, log_path: impl Into<String>) -> Self {
        Self {
            runner,
            container: container.into(),
            log_path: log_path.into(),
        }
    }

    fn exec(&self) -> CommandSpec {
        CommandSpec::new("docker").args(["exec", self.container.as_str()])
    }

    fn target(&self) -> String {
        format!("runtime container {}", self.container)
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

/// Parse `ray status` into an inventory.
pub(crate) fn parse_ray_status(output: &str) -> Result<RuntimeInventory, String> {
    let gpu = Regex::new(r"(?m)^\s*([0-9.]+)/([0-9.]+)\s+GPU\b").map_err(|e| e.to_string())?;
    let node = Regex::new(r"^\s*(\d+)\s+node_").map_err(|e| e.to_string())?;

    let mut active_nodes = 0;
    let mut in_active = false;
    for line in output.lines() {
        let trimmed = line.trim();
        if trimmed == "Active:" {
            in_active = true;
            continue;
        }
        if trimmed.ends_with(':') {
            in_active = false;
        }
        if in_active {
            if let Some(count) = node.captures(line).and_then(|c| c[1].parse::<u32>().ok()) {
                active_nodes += count;
            }
        }
    }

    let (gpus_used, gpus_total) = match gpu.captures(output) {
        Some(caps) => (
            caps[1].parse().map_err(|_| format!("bad GPU usage '{}'", &caps[1]))?,
            caps[2].parse().map_err(|_| format!("bad GPU total '{}'", &caps[2]))?,
        ),
        None if output.contains("Resources") => (0.0, 0.0),
        None => return Err("no resource summary in ray status output".to_string()),
    };

    Ok(RuntimeInventory {
        active_nodes,
        gpus_total,
        gpus_used,
    })
}

#[async_trait]
impl RemoteRuntime for RayRuntime {
    async fn inventory(&self) -> Result<RuntimeInventory, BringupError> {
        let target = self.target();
        let out = self
            .runner
            .run(&self.exec().args(["ray", "status"]))
            .await?
            .into_result(&target)?;
        parse_ray_status(&out.stdout).map_err(|e| BringupError::transient(target, e))
    }

    async fn start_serving(&self, params: &ServeParams) -> Result<ServeOutcome, BringupError> {
        if self.is_serving().await? {
            tracing::info!(container = %self.container, "model server already running");
            return Ok(ServeOutcome::AlreadyServing);
        }

        let args: Vec<String> = params.to_args().iter().map(|a| shell_quote(a)).collect();
        let script = format!(
            "nohup {} {} > {} 2>&1",
            SERVE_PATTERN,
            args.join(" "),
            shell_quote(&self.log_path)
        );
        let spec = CommandSpec::new("docker").args(["exec", "-d", self.container.as_str(), "sh", "-c", script.as_str()]);
        self.runner.run(&spec).await?.into_result(&self.target())?;
        tracing::info!(container = %self.container, model = %params.model, "model server launched");
        Ok(ServeOutcome::Started)
    }

    async fn is_serving(&self) -> Result<bool, BringupError> {
        let out = self
            .runner
            .run(&self.exec().args(["pgrep", "-f", SERVE_PATTERN]))
            .await?;
        match out.code {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => out.into_result(&self.target()).map(|_| false),
        }
    }

    async fn tail_output(&self, lines: usize) -> Result<Vec<String>, BringupError> {
        let count = lines.to_string();
        let out = self
            .runner
            .run(&self.exec().args(["tail", "-n", count.as_str(), self.log_path.as_str()]))
            .await?
            .into_result(&self.target())?;
        Ok(out.stdout.lines().map(str::to_string).collect())
    }
}

#[cfg(test)]
#[path = "ray_tests.rs"]
mod tests;
