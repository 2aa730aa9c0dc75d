// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Formatting helpers for the status display.

use crate::k8s::ObservedResource;

use super::report::{HealthState, Observed, StatusReport};

/// Render the whole snapshot as text.
pub fn render_status(status: &StatusReport) -> String {
    let mut out = String::new();
    render_header(&mut out, status);
    render_resources(&mut out, "Pods", &status.pods);
    render_resources(&mut out, "Deployments", &status.deployments);
    render_resources(&mut out, "Services", &status.services);
    render_fabric(&mut out, status);
    render_runtime(&mut out, status);
    render_log(&mut out, status);
    out
}

fn render_header(out: &mut String, status: &StatusReport) {
    let health_icon = match status.health {
        HealthState::Healthy => "V",
        HealthState::Degraded => "!",
        HealthState::Unhealthy => "X",
    };
    out.push_str("====================================================\n");
    out.push_str(&format!(
        "  GG-BRINGUP Status                      v{}\n",
        env!("CARGO_PKG_VERSION")
    ));
    out.push_str("====================================================\n");
    out.push_str(&format!(
        "  Health: {} {:10}  Namespace: {}\n",
        health_icon,
        status.health.to_string(),
        truncate(&status.namespace, 20)
    ));
    out.push_str(&format!("  Captured: {}\n", status.captured_at));
    out.push_str("====================================================\n");
}

fn render_resources(out: &mut String, title: &str, observed: &Observed<Vec<ObservedResource>>) {
    match observed {
        Observed::Unknown(reason) => {
            out.push_str(&format!("\n{}: unknown ({})\n", title, reason));
        }
        Observed::Known(items) if items.is_empty() => {
            out.push_str(&format!("\n{}: none\n", title));
        }
        Observed::Known(items) => {
            out.push_str(&format!("\n{} ({})\n", title, items.len()));
            out.push_str("  Name                        | Phase        | Ready | Detail\n");
            out.push_str("  ----------------------------+--------------+-------+---------------------\n");
            for item in items {
                out.push_str(&format!(
                    "  {:27} | {:12} | {:>5} | {}\n",
                    truncate(&item.name, 27),
                    truncate(&item.phase, 12),
                    item.ready.as_deref().unwrap_or("-"),
                    truncate(&item.detail, 30)
                ));
            }
        }
    }
}

fn render_fabric(out: &mut String, status: &StatusReport) {
    match &status.fabric {
        Observed::Unknown(reason) => out.push_str(&format!("\nFabric: unknown ({})\n", reason)),
        Observed::Known(links) if links.is_empty() => {
            out.push_str("\nFabric: no candidate interface present\n")
        }
        Observed::Known(links) => {
            out.push_str("\nFabric\n");
            for link in links {
                let carrier = match link.carrier {
                    Some(true) => "carrier",
                    Some(false) => "no carrier",
                    None => "carrier unknown",
                };
                out.push_str(&format!(
                    "  {:16} {:8} {:15} {:>10}  mtu {}\n",
                    truncate(&link.interface, 16),
                    link.operstate,
                    carrier,
                    link.speed_mbps.map(format_speed).unwrap_or_else(|| "-".to_string()),
                    link.mtu.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string())
                ));
            }
        }
    }
}

fn render_runtime(out: &mut String, status: &StatusReport) {
    out.push_str("\nRuntime\n");
    match &status.runtime {
        Observed::Known(inv) => out.push_str(&format!(
            "  Nodes: {}   GPUs: {:.1}/{:.1} used\n",
            inv.active_nodes, inv.gpus_used, inv.gpus_total
        )),
        Observed::Unknown(reason) => out.push_str(&format!("  Inventory: unknown ({})\n", reason)),
    }
    match &status.serving {
        Observed::Known(true) => out.push_str("  Model server: running\n"),
        Observed::Known(false) => out.push_str("  Model server: not running\n"),
        Observed::Unknown(reason) => out.push_str(&format!("  Model server: unknown ({})\n", reason)),
    }
}

fn render_log(out: &mut String, status: &StatusReport) {
    match &status.log_tail {
        Observed::Known(lines) if !lines.is_empty() => {
            out.push_str(&format!("\nRecent Output (last {})\n", lines.len()));
            for line in lines {
                out.push_str(&format!("  {}\n", truncate(line, 100)));
            }
        }
        Observed::Known(_) => {}
        Observed::Unknown(reason) => out.push_str(&format!("\nRecent Output: unknown ({})\n", reason)),
    }
}

/// Format a duration in seconds in human-readable form.
pub fn format_duration(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Format a link speed given in Mb/s.
pub fn format_speed(mbps: u32) -> String {
    if mbps >= 1000 {
        format!("{} Gb/s", mbps / 1000)
    } else {
        format!("{} Mb/s", mbps)
    }
}

/// Truncate a string to a maximum length.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
