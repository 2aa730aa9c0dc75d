// Copyright 2024-2026 GG-CORE Contributors
// SPDX-License-Identifier: Apache-2.0

//! GG-BRINGUP: bring-up reconciler for multi-node GPU inference clusters.
//!
//! Applies an ordered set of cluster resources, binds the fabric address,
//! waits for the distributed runtime and model server to become ready, and
//! tears everything down again in reverse. Every external system is reached
//! through a trait so the reconciler runs unchanged against in-memory fakes.

pub mod bringup;
pub mod cli;
pub mod compute;
pub mod config;
pub mod error;
pub mod exec;
pub mod k8s;
pub mod lifecycle;
pub mod logging;
pub mod network;
pub mod readiness;
pub mod status;
pub mod validation;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;

pub use bringup::{run_up, BringUpReport, Collaborators, UpOptions};
pub use config::Configuration;
pub use error::BringupError;
