// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ordered apply and reverse-ordered delete of a deployment profile.
//!
//! Resources are handled one at a time in profile order. Nothing is rolled
//! back: a failure is recorded and the [`FailurePolicy`] decides whether the
//! cycle goes on.

use crate::error::BringupError;
use crate::k8s::{ApplyAction, ClusterApi, DeploymentProfile, ResourceDescriptor};

use super::outcome::{FailurePolicy, LifecycleReport, Operation, ResourceOutcome, ResourceStatus};

pub struct Orchestrator<'a> {
    cluster: &'a dyn ClusterApi,
}

impl<'a> Orchestrator<'a> {
    pub fn new(cluster: &'a dyn ClusterApi) -> Self {
        Self { cluster }
    }

    /// Apply every descriptor in declaration order.
    pub async fn apply(&self, profile: &DeploymentProfile, policy: FailurePolicy) -> LifecycleReport {
        let descriptors: Vec<&ResourceDescriptor> = profile.descriptors.iter().collect();
        tracing::info!(profile = %profile.kind, resources = descriptors.len(), "applying profile");
        self.run(Operation::Apply, profile, &descriptors, policy).await
    }

    /// Delete every descriptor in reverse declaration order. An absent
    /// resource counts as deleted.
    pub async fn delete(&self, profile: &DeploymentProfile, policy: FailurePolicy) -> LifecycleReport {
        let descriptors: Vec<&ResourceDescriptor> = profile.descriptors.iter().rev().collect();
        tracing::info!(profile = %profile.kind, resources = descriptors.len(), "deleting profile");
        self.run(Operation::Delete, profile, &descriptors, policy).await
    }

    async fn run(
        &self,
        operation: Operation,
        profile: &DeploymentProfile,
        descriptors: &[&ResourceDescriptor],
        policy: FailurePolicy,
    ) -> LifecycleReport {
        let mut outcomes = Vec::with_capacity(descriptors.len());
        let mut aborted = false;

        for descriptor in descriptors {
            let resource = descriptor.id();
            if aborted {
                outcomes.push(ResourceOutcome {
                    resource,
                    status: ResourceStatus::Skipped,
                });
                continue;
            }

            let status = match operation {
                Operation::Apply => apply_status(self.cluster.apply(descriptor).await),
                Operation::Delete => delete_status(self.cluster.delete(descriptor).await),
            };

            match &status {
                ResourceStatus::Failed(e) => {
                    tracing::error!(resource = %resource, operation = %operation, error = %e, "resource failed");
                    aborted = policy == FailurePolicy::AbortOnFailure;
                }
                other => {
                    tracing::info!(resource = %resource, result = %other.label(), "{}", operation);
                }
            }
            outcomes.push(ResourceOutcome { resource, status });
        }

        LifecycleReport {
            operation,
            profile: profile.kind,
            policy,
            outcomes,
        }
    }
}

fn apply_status(result: Result<ApplyAction, BringupError>) -> ResourceStatus {
    match result {
        Ok(ApplyAction::Unchanged) => ResourceStatus::AlreadySatisfied,
        Ok(action) => ResourceStatus::Applied(action),
        Err(e) => ResourceStatus::Failed(e),
    }
}

fn delete_status(result: Result<(), BringupError>) -> ResourceStatus {
    match result {
        Ok(()) => ResourceStatus::Deleted,
        Err(e) if e.is_not_found() => ResourceStatus::AlreadyAbsent,
        Err(e) => ResourceStatus::Failed(e),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
