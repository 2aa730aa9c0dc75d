// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes integration.
//!
//! Resource descriptors, manifest rendering, deployment profiles and the
//! cluster control seam the lifecycle orchestrator drives.

pub mod cluster;
pub mod descriptor;
pub mod kubectl;
pub mod manifests;
pub mod profiles;
pub mod validation;

pub use cluster::{ApplyAction, ClusterApi, ObservedResource};
pub use descriptor::{ManifestOrigin, ResourceDescriptor, ResourceKind};
pub use kubectl::KubectlCluster;
pub use profiles::{DeploymentProfile, ProfileKind};
