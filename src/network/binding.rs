// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fabric address binding and interface selection.
//!
//! Selection is a pure function of what the host reports right now, so it is
//! re-derived on every run and nothing about a previous binding is stored.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// An interface address with prefix length, e.g. `192.168.100.10/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    pub addr: IpAddr,
    pub prefix: u8,
}

impl Cidr {
    pub fn new(addr: IpAddr, prefix: u8) -> Self {
        Self { addr, prefix }
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl FromStr for Cidr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr, prefix) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("'{}' is missing a /prefix length", s))?;
        let addr: IpAddr = addr
            .parse()
            .map_err(|_| format!("'{}' is not an IP address", addr))?;
        let prefix: u8 = prefix
            .parse()
            .map_err(|_| format!("'{}' is not a prefix length", prefix))?;
        let max = if addr.is_ipv4() { 32 } else { 128 };
        if prefix > max {
            return Err(format!("prefix /{} exceeds /{}", prefix, max));
        }
        Ok(Self { addr, prefix })
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Desired fabric address: which interfaces may carry it and whether it
/// should survive a restart of the network stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkBinding {
    pub candidates: Vec<String>,
    pub address: Cidr,
    pub persist: bool,
}

/// Live state of one candidate interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateState {
    pub name: String,
    pub present: bool,
    pub carrier: bool,
}

/// Why a candidate was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    /// First candidate with an active link carrier.
    Carrier,
    /// No candidate had carrier; first one that exists.
    FirstPresent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub interface: String,
    pub reason: SelectionReason,
}

/// Pick the interface to bind, given candidate states in priority order.
pub fn select_interface(states: &[CandidateState]) -> Option<Selection> {
    states
        .iter()
        .find(|s| s.present && s.carrier)
        .map(|s| Selection {
            interface: s.name.clone(),
            reason: SelectionReason::Carrier,
        })
        .or_else(|| {
            states.iter().find(|s| s.present).map(|s| Selection {
                interface: s.name.clone(),
                reason: SelectionReason::FirstPresent,
            })
        })
}
