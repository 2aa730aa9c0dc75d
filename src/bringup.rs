// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! End-to-end bring-up.
//!
//! Stages run in a fixed order: validate, apply the full profile, bind the
//! fabric address, wait for GPU workers, start serving, wait for model health
//! and take a status snapshot. A failed gate or apply always stops the run.
//! Network, serve and readiness problems stop it only in strict mode;
//! otherwise they are recorded as warnings and the next stage runs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::compute::{RayRuntime, RemoteRuntime, ServeOutcome, ServeParams};
use crate::config::Configuration;
use crate::exec::{CommandRunner, SystemRunner};
use crate::k8s::{ClusterApi, DeploymentProfile, KubectlCluster, ProfileKind};
use crate::lifecycle::{FailurePolicy, LifecycleReport, Orchestrator};
use crate::network::{HostNetwork, IdempotentMutator, LinuxHostNetwork, MutationReport, NetworkBinding};
use crate::readiness::{wait_until, ConditionSpec, ProbeDeps, ReadinessPolicy, TimeoutReason, WaitOutcome};
use crate::status::{self, StatusReport, StatusSources};
use crate::validation::{run_all, standard_checks, CheckDeps, ValidationReport, ValidationScope};

/// External systems every command talks to.
pub struct Collaborators {
    pub runner: Arc<dyn CommandRunner>,
    pub cluster: Arc<dyn ClusterApi>,
    pub host: Arc<dyn HostNetwork>,
    pub runtime: Arc<dyn RemoteRuntime>,
}

impl Collaborators {
    /// Real collaborators backed by host commands.
    pub fn system(config: &Configuration) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner::new(config.cluster.command_timeout));
        Self {
            cluster: Arc::new(KubectlCluster::new(
                runner.clone(),
                config.cluster.kubectl.clone(),
                config.cluster.kube_context.clone(),
            )),
            host: Arc::new(LinuxHostNetwork::new(runner.clone(), config.fabric.use_sudo)),
            runtime: Arc::new(RayRuntime::new(
                runner.clone(),
                config.runtime.container.clone(),
                config.runtime.log_path.clone(),
            )),
            runner,
        }
    }

    pub fn probe_deps(&self) -> ProbeDeps {
        ProbeDeps {
            runner: self.runner.clone(),
            cluster: self.cluster.clone(),
            runtime: self.runtime.clone(),
        }
    }

    pub fn check_deps(&self) -> CheckDeps {
        CheckDeps {
            runner: self.runner.clone(),
            host: self.host.clone(),
        }
    }

    pub fn status_sources(&self) -> StatusSources<'_> {
        StatusSources {
            cluster: self.cluster.as_ref(),
            host: self.host.as_ref(),
            runtime: self.runtime.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Validate,
    Apply,
    Network,
    GpuWorkers,
    Serve,
    ModelHealth,
    Status,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validate => "validate",
            Self::Apply => "apply",
            Self::Network => "network",
            Self::GpuWorkers => "gpu-workers",
            Self::Serve => "serve",
            Self::ModelHealth => "model-health",
            Self::Status => "status",
        })
    }
}

/// Result of a single non-waiting step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "value")]
pub enum StepResult<T> {
    Done(T),
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
pub struct UpOptions {
    pub strict: bool,
    pub policy: FailurePolicy,
    pub log_lines: usize,
}

impl UpOptions {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            strict: config.strict,
            policy: FailurePolicy::AbortOnFailure,
            log_lines: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BringUpReport {
    pub succeeded: bool,
    pub strict: bool,
    pub aborted_at: Option<Stage>,
    pub abort_reason: Option<String>,
    pub validation: Option<ValidationReport>,
    pub apply: Option<LifecycleReport>,
    pub network: Option<StepResult<MutationReport>>,
    pub gpu_workers: Option<WaitOutcome>,
    pub serve: Option<StepResult<ServeOutcome>>,
    pub model_health: Option<WaitOutcome>,
    pub status: Option<StatusReport>,
    pub warnings: Vec<String>,
}

impl BringUpReport {
    fn new(strict: bool) -> Self {
        Self {
            succeeded: false,
            strict,
            aborted_at: None,
            abort_reason: None,
            validation: None,
            apply: None,
            network: None,
            gpu_workers: None,
            serve: None,
            model_health: None,
            status: None,
            warnings: Vec::new(),
        }
    }

    fn abort(mut self, stage: Stage, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        tracing::error!(stage = %stage, reason = %reason, "bring-up aborted");
        self.aborted_at = Some(stage);
        self.abort_reason = Some(reason);
        self.succeeded = false;
        self
    }

    /// Record a non-fatal problem. Returns true when the run must stop.
    fn problem(&mut self, stage: Stage, detail: String) -> bool {
        if self.strict {
            return true;
        }
        tracing::warn!(stage = %stage, detail = %detail, "continuing past problem");
        self.warnings.push(format!("{}: {}", stage, detail));
        false
    }
}

fn wait_problem(outcome: &WaitOutcome) -> Option<(bool, String)> {
    match outcome {
        WaitOutcome::Ready { .. } => None,
        WaitOutcome::Timeout {
            attempts,
            reason,
            last_observation,
            ..
        } => {
            let last = last_observation.as_deref().unwrap_or("no observation");
            let cancelled = *reason == TimeoutReason::Cancelled;
            Some((cancelled, format!("not ready after {} attempt(s), last: {}", attempts, last)))
        }
    }
}

/// Bring the stack up, stage by stage.
pub async fn run_up(
    config: &Configuration,
    collab: &Collaborators,
    options: &UpOptions,
    cancel: &CancellationToken,
) -> BringUpReport {
    let mut report = BringUpReport::new(options.strict);

    tracing::info!(stage = %Stage::Validate, "running validation gate");
    let validation = run_all(&standard_checks(config, &collab.check_deps(), ValidationScope::All)).await;
    let gate_passed = validation.passed;
    let blocking: Vec<String> = validation.blocking().map(|e| format!("{}: {}", e.check, e.detail)).collect();
    for entry in validation.warnings() {
        report.warnings.push(format!("{}: {}", entry.check, entry.detail));
    }
    report.validation = Some(validation);
    if !gate_passed {
        return report.abort(Stage::Validate, blocking.join("; "));
    }

    let profile = match DeploymentProfile::build(config, ProfileKind::All) {
        Ok(profile) => profile,
        Err(e) => return report.abort(Stage::Apply, e.to_string()),
    };
    let applied = Orchestrator::new(collab.cluster.as_ref()).apply(&profile, options.policy).await;
    let apply_error = applied.first_error().map(|e| e.to_string());
    report.apply = Some(applied);
    if let Some(error) = apply_error {
        return report.abort(Stage::Apply, error);
    }

    tracing::info!(stage = %Stage::Network, "ensuring fabric address");
    let binding = NetworkBinding::from_config(config);
    match IdempotentMutator::new(collab.host.as_ref()).ensure(&binding).await {
        Ok(mutation) => {
            if let Some(warning) = mutation.persistence.warning() {
                report.warnings.push(format!("{}: persistence failed: {}", Stage::Network, warning));
            }
            report.network = Some(StepResult::Done(mutation));
        }
        Err(e) => {
            let detail = e.to_string();
            report.network = Some(StepResult::Failed(detail.clone()));
            if report.problem(Stage::Network, detail.clone()) {
                return report.abort(Stage::Network, detail);
            }
        }
    }

    let policy = ReadinessPolicy::from_settings(&config.readiness);
    let deps = collab.probe_deps();

    let gpu_probe = ConditionSpec::GpuWorkers(None).build(config, &deps);
    tracing::info!(stage = %Stage::GpuWorkers, condition = %gpu_probe.describe(), "waiting");
    let gpu_wait = wait_until(gpu_probe.as_ref(), &policy, cancel).await;
    let gpu_problem = wait_problem(&gpu_wait);
    report.gpu_workers = Some(gpu_wait);
    if let Some((cancelled, detail)) = gpu_problem {
        if cancelled {
            return report.abort(Stage::GpuWorkers, "cancelled by operator");
        }
        if report.problem(Stage::GpuWorkers, detail.clone()) {
            return report.abort(Stage::GpuWorkers, detail);
        }
    }

    let params = ServeParams::from_config(config);
    tracing::info!(stage = %Stage::Serve, model = %params.model, "starting model server");
    match collab.runtime.start_serving(&params).await {
        Ok(outcome) => report.serve = Some(StepResult::Done(outcome)),
        Err(e) => {
            let detail = e.to_string();
            report.serve = Some(StepResult::Failed(detail.clone()));
            if report.problem(Stage::Serve, detail.clone()) {
                return report.abort(Stage::Serve, detail);
            }
        }
    }

    let health_probe = ConditionSpec::ModelHealth(None).build(config, &deps);
    tracing::info!(stage = %Stage::ModelHealth, condition = %health_probe.describe(), "waiting");
    let health_wait = wait_until(health_probe.as_ref(), &policy, cancel).await;
    let health_problem = wait_problem(&health_wait);
    report.model_health = Some(health_wait);
    if let Some((cancelled, detail)) = health_problem {
        if cancelled {
            return report.abort(Stage::ModelHealth, "cancelled by operator");
        }
        if report.problem(Stage::ModelHealth, detail.clone()) {
            return report.abort(Stage::ModelHealth, detail);
        }
    }

    report.status = Some(status::collect(config, &collab.status_sources(), options.log_lines).await);
    report.succeeded = true;
    tracing::info!(warnings = report.warnings.len(), "bring-up finished");
    report
}

/// Total time a wait may take with `policy`, for progress messages.
pub fn wait_budget(policy: &ReadinessPolicy) -> Duration {
    let sleeps = policy.delay.saturating_mul(policy.max_attempts.saturating_sub(1));
    policy.deadline.map_or(sleeps, |d| d.min(sleeps))
}

#[cfg(test)]
#[path = "bringup_tests.rs"]
mod tests;
