// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Built-in bring-up checks.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{keys, Configuration};
use crate::error::BringupError;
use crate::exec::{CommandRunner, CommandSpec};
use crate::k8s::{DeploymentProfile, ProfileKind};
use crate::network::HostNetwork;

use super::gate::{Check, CheckOutcome, ValidationScope};

/// Semantic configuration problems found at load time.
pub struct ConfigCompleteness {
    issues: Vec<BringupError>,
}

#[async_trait]
impl Check for ConfigCompleteness {
    fn name(&self) -> String {
        "configuration".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Config
    }

    async fn run(&self) -> CheckOutcome {
        if self.issues.is_empty() {
            CheckOutcome::pass(format!("{} keys resolved", keys::KEYS.len()))
        } else {
            let rendered: Vec<String> = self.issues.iter().map(ToString::to_string).collect();
            CheckOutcome::fail(rendered.join("; "))
        }
    }
}

/// Token presence. Absence is a warning: only gated models need it.
pub struct TokenPresence {
    present: bool,
    model: String,
    gated: bool,
}

#[async_trait]
impl Check for TokenPresence {
    fn name(&self) -> String {
        "hf-token".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Config
    }

    async fn run(&self) -> CheckOutcome {
        match (self.present, self.gated) {
            (true, _) => CheckOutcome::pass("token set"),
            (false, true) => CheckOutcome::degraded(format!(
                "token missing; {} is gated and will fail to download without it",
                self.model
            )),
            (false, false) => CheckOutcome::degraded("token missing"),
        }
    }
}

/// Tool on PATH, checked with `command -v`. The name is passed as a
/// positional argument and never spliced into the script.
pub struct ToolAvailable {
    runner: Arc<dyn CommandRunner>,
    tool: String,
    required: bool,
}

#[async_trait]
impl Check for ToolAvailable {
    fn name(&self) -> String {
        format!("tool:{}", self.tool)
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Tools
    }

    fn mandatory(&self) -> bool {
        self.required
    }

    async fn run(&self) -> CheckOutcome {
        let spec = CommandSpec::new("sh").args(["-c", "command -v \"$1\"", "sh", self.tool.as_str()]);
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => CheckOutcome::pass(out.stdout.trim().to_string()),
            Ok(_) if self.required => CheckOutcome::fail(format!("{} not found on PATH", self.tool)),
            Ok(_) => CheckOutcome::degraded(format!("{} not found on PATH (optional)", self.tool)),
            Err(e) => CheckOutcome::degraded(format!("could not look up {}: {}", self.tool, e)),
        }
    }
}

/// At least one fabric candidate exists on this host.
pub struct FabricInterfacePresent {
    host: Arc<dyn HostNetwork>,
    candidates: Vec<String>,
}

#[async_trait]
impl Check for FabricInterfacePresent {
    fn name(&self) -> String {
        "fabric-interface".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Network
    }

    async fn run(&self) -> CheckOutcome {
        let present = match self.host.interfaces().await {
            Ok(names) => names,
            Err(e) => return CheckOutcome::fail(e.to_string()),
        };
        let found: Vec<&String> = self.candidates.iter().filter(|c| present.contains(c)).collect();
        if found.is_empty() {
            CheckOutcome::fail(
                BringupError::NoCandidateInterface {
                    candidates: self.candidates.clone(),
                }
                .to_string(),
            )
        } else {
            let names: Vec<&str> = found.iter().map(|s| s.as_str()).collect();
            CheckOutcome::pass(format!("present: {}", names.join(", ")))
        }
    }
}

/// Peer answers one ping. Optional: the fabric address may not be bound yet.
/// Registered only when a peer is configured.
pub struct PeerReachable {
    runner: Arc<dyn CommandRunner>,
    peer: IpAddr,
}

#[async_trait]
impl Check for PeerReachable {
    fn name(&self) -> String {
        "peer-reachable".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Network
    }

    fn mandatory(&self) -> bool {
        false
    }

    async fn run(&self) -> CheckOutcome {
        let peer = self.peer;
        let addr = peer.to_string();
        let spec = CommandSpec::new("ping").args(["-c", "1", "-W", "2", addr.as_str()]);
        match self.runner.run(&spec).await {
            Ok(out) if out.success() => CheckOutcome::pass(format!("{} answered", peer)),
            Ok(_) => CheckOutcome::fail(format!("{} did not answer", peer)),
            Err(e) => CheckOutcome::degraded(format!("ping unavailable: {}", e)),
        }
    }
}

/// Closest existing ancestor of `path`, itself included.
fn existing_ancestor(path: &Path) -> Option<&Path> {
    path.ancestors().find(|p| p.exists())
}

#[cfg(unix)]
fn free_bytes(path: &Path) -> Result<u64, String> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|e| e.to_string())?;
    let mut stats = std::mem::MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and stats points to writable memory of the right size.
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stats.as_mut_ptr()) };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().to_string());
    }
    // SAFETY: statvfs returned 0, so the struct is initialised.
    let stats = unsafe { stats.assume_init() };
    Ok((stats.f_bavail as u64).saturating_mul(stats.f_frsize as u64))
}

#[cfg(not(unix))]
fn free_bytes(_path: &Path) -> Result<u64, String> {
    Err("free space probing is only supported on Unix".to_string())
}

const GIB: u64 = 1024 * 1024 * 1024;

/// Free space under the model cache directory.
pub struct CacheFreeSpace {
    path: PathBuf,
    min_gb: u64,
}

#[async_trait]
impl Check for CacheFreeSpace {
    fn name(&self) -> String {
        "cache-free-space".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Storage
    }

    async fn run(&self) -> CheckOutcome {
        let Some(probe_path) = existing_ancestor(&self.path) else {
            return CheckOutcome::fail(format!("no existing ancestor of {}", self.path.display()));
        };
        match free_bytes(probe_path) {
            Ok(bytes) => {
                let gb = bytes / GIB;
                let detail = format!("{} GiB free at {} (need {})", gb, probe_path.display(), self.min_gb);
                if gb >= self.min_gb {
                    CheckOutcome::pass(detail)
                } else {
                    CheckOutcome::fail(detail)
                }
            }
            Err(e) => CheckOutcome::degraded(format!("cannot stat {}: {}", probe_path.display(), e)),
        }
    }
}

/// The full profile renders and every extra manifest parses.
pub struct ManifestSyntax {
    config: Configuration,
}

#[async_trait]
impl Check for ManifestSyntax {
    fn name(&self) -> String {
        "manifests".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Manifests
    }

    async fn run(&self) -> CheckOutcome {
        match DeploymentProfile::build(&self.config, ProfileKind::All) {
            Ok(profile) => {
                for d in &profile.descriptors {
                    if let Err(e) = serde_json::to_string(&d.manifest) {
                        return CheckOutcome::fail(format!("{}: {}", d.id(), e));
                    }
                }
                CheckOutcome::pass(format!("{} resource(s) rendered", profile.len()))
            }
            Err(e) => CheckOutcome::fail(e.to_string()),
        }
    }
}

/// GPUs visible to the driver. Absent hardware is degraded, not failed.
pub struct GpuPresence {
    runner: Arc<dyn CommandRunner>,
}

#[async_trait]
impl Check for GpuPresence {
    fn name(&self) -> String {
        "gpu".to_string()
    }

    fn scope(&self) -> ValidationScope {
        ValidationScope::Hardware
    }

    fn mandatory(&self) -> bool {
        false
    }

    async fn run(&self) -> CheckOutcome {
        match self.runner.run(&CommandSpec::new("nvidia-smi").arg("-L")).await {
            Ok(out) if out.success() => {
                let gpus = out.stdout.lines().filter(|l| l.starts_with("GPU ")).count();
                if gpus > 0 {
                    CheckOutcome::pass(format!("{} GPU(s) visible", gpus))
                } else {
                    CheckOutcome::degraded("nvidia-smi lists no GPUs")
                }
            }
            Ok(out) => CheckOutcome::degraded(format!("nvidia-smi failed: {}", out.stderr.trim())),
            Err(e) => CheckOutcome::degraded(format!("nvidia-smi unavailable: {}", e)),
        }
    }
}

/// Collaborators the built-in checks read from.
pub struct CheckDeps {
    pub runner: Arc<dyn CommandRunner>,
    pub host: Arc<dyn HostNetwork>,
}

/// Built-in checks for `scope`, in declaration order.
pub fn standard_checks(config: &Configuration, deps: &CheckDeps, scope: ValidationScope) -> Vec<Box<dyn Check>> {
    let mut checks: Vec<Box<dyn Check>> = vec![
        Box::new(ConfigCompleteness {
            issues: config.issues(),
        }),
        Box::new(TokenPresence {
            present: config.serving.hf_token.is_some(),
            model: config.serving.model.to_string(),
            gated: config.serving.model.gated(),
        }),
    ];

    let mut tools = vec![
        (config.cluster.kubectl.clone(), true),
        ("ip".to_string(), true),
        ("curl".to_string(), true),
    ];
    if config.fabric.persist {
        tools.push(("nmcli".to_string(), false));
    }
    tools.push(("docker".to_string(), false));
    for (tool, required) in tools {
        checks.push(Box::new(ToolAvailable {
            runner: deps.runner.clone(),
            tool,
            required,
        }));
    }

    checks.push(Box::new(FabricInterfacePresent {
        host: deps.host.clone(),
        candidates: config.fabric.interfaces.clone(),
    }));
    if let Some(peer) = config.fabric.peer_address {
        checks.push(Box::new(PeerReachable {
            runner: deps.runner.clone(),
            peer,
        }));
    }
    checks.push(Box::new(CacheFreeSpace {
        path: config.storage.cache_dir.clone(),
        min_gb: config.storage.min_free_gb,
    }));
    checks.push(Box::new(ManifestSyntax { config: config.clone() }));
    checks.push(Box::new(GpuPresence {
        runner: deps.runner.clone(),
    }));

    checks.retain(|c| scope.includes(c.scope()));
    checks
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;
