// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host network inspection and mutation.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::BringupError;
use crate::exec::{CommandRunner, CommandSpec};

use super::binding::Cidr;

/// Link-layer diagnostics for one interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub interface: String,
    pub operstate: String,
    pub carrier: Option<bool>,
    pub speed_mbps: Option<u32>,
    pub mtu: Option<u32>,
}

/// Operations on the host's interfaces.
///
/// Every read goes to the live system; implementations keep no cache.
#[async_trait]
pub trait HostNetwork: Send + Sync {
    /// Names of all interfaces on the host.
    async fn interfaces(&self) -> Result<Vec<String>, BringupError>;

    /// Whether the interface reports an active carrier. A down link is `false`.
    async fn carrier(&self, interface: &str) -> Result<bool, BringupError>;

    async fn addresses(&self, interface: &str) -> Result<Vec<Cidr>, BringupError>;

    async fn add_address(&self, interface: &str, address: &Cidr) -> Result<(), BringupError>;

    /// Record the address in the persistent network configuration.
    /// Returns `false` when it was already recorded.
    async fn persist_address(&self, interface: &str, address: &Cidr) -> Result<bool, BringupError>;

    async fn link_info(&self, interface: &str) -> Result<LinkInfo, BringupError>;
}

pub const DEFAULT_SYSFS_NET: &str = "/sys/class/net";

/// Linux implementation: sysfs for link state, iproute2 for addresses,
/// NetworkManager for persistence.
pub struct LinuxHostNetwork {
    runner: Arc<dyn CommandRunner>,
    sysfs: PathBuf,
    use_sudo: bool,
}

impl LinuxHostNetwork {
    pub fn new(runner: Arc<dyn CommandRunner>, use_sudo: bool) -> Self {
        Self {
            runner,
            sysfs: PathBuf::from(DEFAULT_SYSFS_NET),
            use_sudo,
        }
    }

    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs = root.into();
        self
    }

    async fn read_attr(&self, interface: &str, attr: &str) -> Option<String> {
        tokio::fs::read_to_string(self.sysfs.join(interface).join(attr))
            .await
            .ok()
            .map(|s| s.trim().to_string())
    }

    async fn ensure_exists(&self, interface: &str) -> Result<(), BringupError> {
        match tokio::fs::metadata(self.sysfs.join(interface)).await {
            Ok(_) => Ok(()),
            Err(_) => Err(BringupError::NotFound {
                resource: format!("interface {}", interface),
            }),
        }
    }

    /// NetworkManager connection bound to `interface`.
    async fn connection_for(&self, interface: &str) -> Result<String, BringupError> {
        let spec = CommandSpec::new("nmcli").args(["-t", "-f", "NAME,DEVICE", "connection", "show"]);
        let out = self.runner.run(&spec).await?.into_result("nmcli")?;
        find_connection(&out.stdout, interface).ok_or_else(|| BringupError::NotFound {
            resource: format!("NetworkManager connection for {}", interface),
        })
    }
}

#[derive(Debug, Deserialize)]
struct IpLink {
    #[serde(default)]
    addr_info: Vec<IpAddrInfo>,
}

#[derive(Debug, Deserialize)]
struct IpAddrInfo {
    local: Option<String>,
    prefixlen: Option<u8>,
}

/// Parse `ip -j addr show` output.
pub(crate) fn parse_ip_addresses(stdout: &str) -> Result<Vec<Cidr>, String> {
    let links: Vec<IpLink> = serde_json::from_str(stdout).map_err(|e| format!("unparseable ip output: {}", e))?;
    Ok(links
        .iter()
        .flat_map(|link| link.addr_info.iter())
        .filter_map(|info| {
            let addr = info.local.as_deref()?.parse().ok()?;
            Some(Cidr::new(addr, info.prefixlen?))
        })
        .collect())
}

/// Find the connection name in `nmcli -t -f NAME,DEVICE connection show` output.
/// Terse mode escapes colons inside names as `\:`.
pub(crate) fn find_connection(stdout: &str, interface: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (name, device) = line.rsplit_once(':')?;
        (device == interface).then(|| name.replace("\\:", ":"))
    })
}

#[async_trait]
impl HostNetwork for LinuxHostNetwork {
    async fn interfaces(&self) -> Result<Vec<String>, BringupError> {
        let mut entries = tokio::fs::read_dir(&self.sysfs).await.map_err(|e| {
            BringupError::transient(self.sysfs.display().to_string(), e.to_string())
        })?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BringupError::transient(self.sysfs.display().to_string(), e.to_string()))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }

    async fn carrier(&self, interface: &str) -> Result<bool, BringupError> {
        self.ensure_exists(interface).await?;
        // Reading carrier on an administratively down link fails with EINVAL.
        Ok(self.read_attr(interface, "carrier").await.as_deref() == Some("1"))
    }

    async fn addresses(&self, interface: &str) -> Result<Vec<Cidr>, BringupError> {
        let spec = CommandSpec::new("ip").args(["-j", "addr", "show", "dev", interface]);
        let target = format!("interface {}", interface);
        let out = self.runner.run(&spec).await?.into_result(&target)?;
        parse_ip_addresses(&out.stdout).map_err(|e| BringupError::transient(target, e))
    }

    async fn add_address(&self, interface: &str, address: &Cidr) -> Result<(), BringupError> {
        let cidr = address.to_string();
        let spec = CommandSpec::new("ip")
            .args(["addr", "add", cidr.as_str(), "dev", interface])
            .privileged(self.use_sudo);
        let out = self.runner.run(&spec).await?;
        if out.success() || out.stderr.contains("File exists") {
            return Ok(());
        }
        out.into_result(&format!("interface {}", interface)).map(|_| ())
    }

    async fn persist_address(&self, interface: &str, address: &Cidr) -> Result<bool, BringupError> {
        let connection = self.connection_for(interface).await?;
        let target = format!("connection {}", connection);

        let show = CommandSpec::new("nmcli").args(["-g", "ipv4.addresses", "connection", "show", connection.as_str()]);
        let current = self.runner.run(&show).await?.into_result(&target)?;
        let wanted = address.to_string();
        if current.stdout.split(',').any(|a| a.trim() == wanted) {
            return Ok(false);
        }

        let modify = CommandSpec::new("nmcli")
            .args(["connection", "modify", connection.as_str(), "+ipv4.addresses", wanted.as_str()])
            .privileged(self.use_sudo);
        self.runner.run(&modify).await?.into_result(&target)?;
        Ok(true)
    }

    async fn link_info(&self, interface: &str) -> Result<LinkInfo, BringupError> {
        self.ensure_exists(interface).await?;
        let carrier = self.read_attr(interface, "carrier").await.map(|c| c == "1");
        Ok(LinkInfo {
            interface: interface.to_string(),
            operstate: self
                .read_attr(interface, "operstate")
                .await
                .unwrap_or_else(|| "unknown".to_string()),
            carrier,
            // Speed reads as -1 when the link is down.
            speed_mbps: self.read_attr(interface, "speed").await.and_then(|s| s.parse().ok()),
            mtu: self.read_attr(interface, "mtu").await.and_then(|s| s.parse().ok()),
        })
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
