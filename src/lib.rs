//! Buildstamp: a status page for container smoke tests.
//!
//! Serves the image name, commit and build date baked into the image, the
//! container's own identity (from its control group file, the hostname, and
//! optionally the Docker daemon), a curated environment table, and a
//! `/healthz` liveness probe.

pub mod config;
pub mod error;
pub mod http;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod runtime;
pub mod snapshot;
pub mod state;
pub mod templates;
