//! Minikube
//!
//! Provisions and manages single-node Kubernetes clusters for local development.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    minikube::cli::run().await
}
