// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Distributed compute runtime seam.
//!
//! The runtime hosts the model server across nodes. Bring-up waits for its
//! GPU inventory, then asks it to start serving.

pub mod ray;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::Configuration;
use crate::error::BringupError;

pub use ray::RayRuntime;

/// Resources the runtime currently reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RuntimeInventory {
    pub active_nodes: u32,
    pub gpus_total: f64,
    pub gpus_used: f64,
}

impl RuntimeInventory {
    /// Whole GPU-class workers available.
    pub fn gpu_workers(&self) -> u32 {
        if self.gpus_total.is_finite() && self.gpus_total > 0.0 {
            self.gpus_total.floor() as u32
        } else {
            0
        }
    }
}

/// Parameters for starting the distributed model server.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServeParams {
    pub model: String,
    pub tensor_parallel_size: u32,
    pub pipeline_parallel_size: u32,
    pub gpu_memory_utilization: f64,
    pub max_model_len: u32,
    pub port: u16,
}

impl ServeParams {
    pub fn from_config(config: &Configuration) -> Self {
        let s = &config.serving;
        Self {
            model: s.model.hf_id().to_string(),
            tensor_parallel_size: s.tensor_parallel_size,
            pipeline_parallel_size: s.pipeline_parallel_size,
            gpu_memory_utilization: s.gpu_memory_utilization,
            max_model_len: s.max_model_len,
            port: config.runtime.serve_port,
        }
    }

    /// Arguments after `vllm serve`.
    pub fn to_args(&self) -> Vec<String> {
        vec![
            self.model.clone(),
            "--tensor-parallel-size".to_string(),
            self.tensor_parallel_size.to_string(),
            "--pipeline-parallel-size".to_string(),
            self.pipeline_parallel_size.to_string(),
            "--gpu-memory-utilization".to_string(),
            format!("{:.2}", self.gpu_memory_utilization),
            "--max-model-len".to_string(),
            self.max_model_len.to_string(),
            "--port".to_string(),
            self.port.to_string(),
            "--host".to_string(),
            "0.0.0.0".to_string(),
            "--distributed-executor-backend".to_string(),
            "ray".to_string(),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeOutcome {
    Started,
    /// A serve process was already running; nothing was launched.
    AlreadyServing,
}

#[async_trait]
pub trait RemoteRuntime: Send + Sync {
    async fn inventory(&self) -> Result<RuntimeInventory, BringupError>;

    /// Start the model server unless one is already running.
    async fn start_serving(&self, params: &ServeParams) -> Result<ServeOutcome, BringupError>;

    async fn is_serving(&self) -> Result<bool, BringupError>;

    /// Last `lines` lines of the serve process output.
    async fn tail_output(&self, lines: usize) -> Result<Vec<String>, BringupError>;
}
