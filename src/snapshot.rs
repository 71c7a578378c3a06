//! Per-request status snapshot.
//!
//! Gathers build metadata, container identity, daemon metadata and the
//! curated environment table into one value for rendering. Every field is
//! populated: anything that could not be determined holds a placeholder.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::{BuildInfo, UNAVAILABLE};
use crate::identity::{get_container_identity, local_hostname};
use crate::runtime::{get_runtime_descriptive_metadata, RuntimeMetadata};
use crate::state::AppState;

/// One row of the "Container Environment" card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvEntry {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub image_name: String,
    pub git_commit: String,
    pub build_date: String,
    pub hostname: String,
    pub server_time: DateTime<Utc>,
    pub container_id: String,
    pub container_name: String,
    pub image_id: String,
    pub image_digest: String,
    /// Present variables only, in configured order
    pub environment: Vec<EnvEntry>,
}

impl StatusSnapshot {
    /// Collect a snapshot for the current request.
    pub async fn collect(state: &AppState) -> Self {
        let hostname = local_hostname();
        let identity = get_container_identity(&state.config.identity.cgroup_path, &hostname);
        let metadata = get_runtime_descriptive_metadata(state.runtime.as_ref(), &hostname).await;
        let environment = collect_env_table(&state.config.environment.keys, |key| {
            std::env::var(key).ok()
        });

        Self::assemble(
            &state.build,
            hostname,
            identity.id,
            metadata,
            environment,
            Utc::now(),
        )
    }

    /// Combine already-resolved parts. The daemon's container ID, when
    /// available, replaces the self-identified one.
    pub fn assemble(
        build: &BuildInfo,
        hostname: String,
        self_id: String,
        metadata: RuntimeMetadata,
        environment: Vec<EnvEntry>,
        server_time: DateTime<Utc>,
    ) -> Self {
        let (container_id, container_name, image_id, image_digest) = match metadata {
            RuntimeMetadata::Available(details) => (
                details.container_id,
                details.container_name,
                details.image_id,
                details
                    .image_digest
                    .unwrap_or_else(|| UNAVAILABLE.to_string()),
            ),
            RuntimeMetadata::Unavailable => (
                self_id,
                UNAVAILABLE.to_string(),
                UNAVAILABLE.to_string(),
                UNAVAILABLE.to_string(),
            ),
        };

        Self {
            image_name: build.image_name.clone(),
            git_commit: build.git_commit.clone(),
            build_date: build.build_date.clone(),
            hostname,
            server_time,
            container_id,
            container_name,
            image_id,
            image_digest,
            environment,
        }
    }
}

/// Look up each key in order, keeping only the ones that are set.
pub fn collect_env_table<F>(keys: &[String], lookup: F) -> Vec<EnvEntry>
where
    F: Fn(&str) -> Option<String>,
{
    keys.iter()
        .filter_map(|key| {
            lookup(key).map(|value| EnvEntry {
                key: key.clone(),
                value,
            })
        })
        .collect()
}
