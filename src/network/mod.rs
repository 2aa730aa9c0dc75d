// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Fabric network binding.

pub mod binding;
pub mod host;
pub mod mutator;

pub use binding::{select_interface, CandidateState, Cidr, NetworkBinding, Selection, SelectionReason};
pub use host::{HostNetwork, LinkInfo, LinuxHostNetwork};
pub use mutator::{IdempotentMutator, MutationOutcome, MutationReport, PersistOutcome};

use crate::config::Configuration;

impl NetworkBinding {
    pub fn from_config(config: &Configuration) -> Self {
        Self {
            candidates: config.fabric.interfaces.clone(),
            address: config.fabric.address,
            persist: config.fabric.persist,
        }
    }
}
