// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Idempotent fabric address mutation.
//!
//! The mutator only ever adds the one address it was asked for. Addresses
//! already on the interface are left alone, whoever put them there. An
//! address already held by another present candidate is never duplicated.

use serde::Serialize;

use crate::error::BringupError;

use super::binding::{select_interface, CandidateState, Cidr, NetworkBinding, SelectionReason};
use super::host::HostNetwork;

/// Effect of the runtime-level mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationOutcome {
    Applied,
    AlreadySatisfied,
    /// Another candidate carries the address; the report names that one.
    HeldElsewhere,
}

/// Effect of the persistence step. Failure here is a warning only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "detail")]
pub enum PersistOutcome {
    Persisted,
    AlreadyPersisted,
    Skipped,
    Failed(String),
}

impl PersistOutcome {
    pub fn warning(&self) -> Option<&str> {
        match self {
            Self::Failed(detail) => Some(detail),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationReport {
    pub interface: String,
    pub reason: SelectionReason,
    pub address: Cidr,
    pub outcome: MutationOutcome,
    pub persistence: PersistOutcome,
}

pub struct IdempotentMutator<'a> {
    host: &'a dyn HostNetwork,
}

impl<'a> IdempotentMutator<'a> {
    pub fn new(host: &'a dyn HostNetwork) -> Self {
        Self { host }
    }

    /// Live state of every candidate, in priority order.
    pub async fn inspect(&self, candidates: &[String]) -> Result<Vec<CandidateState>, BringupError> {
        let present = self.host.interfaces().await?;
        let mut states = Vec::with_capacity(candidates.len());
        for name in candidates {
            let exists = present.iter().any(|p| p == name);
            let carrier = if exists {
                match self.host.carrier(name).await {
                    Ok(c) => c,
                    Err(e) => {
                        tracing::debug!(interface = %name, error = %e, "carrier unreadable");
                        false
                    }
                }
            } else {
                false
            };
            states.push(CandidateState {
                name: name.clone(),
                present: exists,
                carrier,
            });
        }
        Ok(states)
    }

    /// First present candidate other than `selected` already carrying `address`.
    async fn holder(
        &self,
        states: &[CandidateState],
        selected: &str,
        address: &Cidr,
    ) -> Result<Option<String>, BringupError> {
        for state in states.iter().filter(|s| s.present && s.name != selected) {
            if self.host.addresses(&state.name).await?.contains(address) {
                return Ok(Some(state.name.clone()));
            }
        }
        Ok(None)
    }

    /// Make sure `binding.address` is on the selected interface, or already
    /// on another candidate.
    ///
    /// # Errors
    /// `NoCandidateInterface` when no candidate exists, or the classified
    /// failure of the address query or add.
    pub async fn ensure(&self, binding: &NetworkBinding) -> Result<MutationReport, BringupError> {
        let states = self.inspect(&binding.candidates).await?;
        let selection = select_interface(&states).ok_or_else(|| BringupError::NoCandidateInterface {
            candidates: binding.candidates.clone(),
        })?;
        let selected = selection.interface;
        tracing::info!(interface = %selected, reason = ?selection.reason, "selected fabric interface");

        let current = self.host.addresses(&selected).await?;
        let (interface, outcome) = if current.contains(&binding.address) {
            tracing::info!(interface = %selected, address = %binding.address, "address already present");
            (selected, MutationOutcome::AlreadySatisfied)
        } else if let Some(holder) = self.holder(&states, &selected, &binding.address).await? {
            tracing::warn!(
                selected = %selected,
                holder = %holder,
                address = %binding.address,
                "address held by another candidate, not duplicating"
            );
            (holder, MutationOutcome::HeldElsewhere)
        } else {
            self.host.add_address(&selected, &binding.address).await?;
            tracing::info!(interface = %selected, address = %binding.address, "address added");
            (selected, MutationOutcome::Applied)
        };

        let persistence = if binding.persist {
            match self.host.persist_address(&interface, &binding.address).await {
                Ok(true) => PersistOutcome::Persisted,
                Ok(false) => PersistOutcome::AlreadyPersisted,
                Err(e) => {
                    tracing::warn!(interface = %interface, error = %e, "address not persisted");
                    PersistOutcome::Failed(e.to_string())
                }
            }
        } else {
            PersistOutcome::Skipped
        };

        Ok(MutationReport {
            interface,
            reason: selection.reason,
            address: binding.address,
            outcome,
            persistence,
        })
    }
}

#[cfg(test)]
#[path = "mutator_tests.rs"]
mod tests;
