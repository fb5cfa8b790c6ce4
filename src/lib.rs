//! Minikube startup and configuration layer.
//!
//! This crate exports the pieces that run before any subcommand: directory
//! provisioning, layered configuration, flag resolution, log setup and the
//! startup notices.

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod error;
pub mod flags;
pub mod logging;
pub mod machine;
pub mod notify;
pub mod paths;
