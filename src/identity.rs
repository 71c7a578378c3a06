//! Container self-identification.
//!
//! Two strategies, tried in order:
//! 1. Scan the process's control group file for a line owned by a container
//!    runtime and take the trailing path segment as the container ID.
//! 2. Fall back to the machine hostname, which Docker sets to the short
//!    container ID by default.
//!
//! Resolution never fails; the strategy that produced the value is reported
//! in [`IdentitySource`].

use std::path::Path;

use crate::config::{SHORT_ID_LEN, UNKNOWN};

/// Substrings that mark a cgroup line as belonging to a container runtime
const RUNTIME_MARKERS: &[&str] = &["docker", "containerd"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Cgroup,
    Hostname,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerIdentity {
    pub id: String,
    pub source: IdentitySource,
}

/// Resolve the current container's identity.
///
/// Reads `cgroup_path`; if it is missing, unreadable, or has no runtime-owned
/// line, returns `hostname` instead.
pub fn get_container_identity(cgroup_path: &Path, hostname: &str) -> ContainerIdentity {
    match std::fs::read_to_string(cgroup_path) {
        Ok(contents) => {
            if let Some(id) = parse_cgroup(&contents) {
                return ContainerIdentity {
                    id,
                    source: IdentitySource::Cgroup,
                };
            }
            tracing::debug!(path = %cgroup_path.display(), "No container runtime entry in cgroup file");
        }
        Err(e) => {
            tracing::debug!(path = %cgroup_path.display(), error = %e, "Cgroup file unreadable");
        }
    }

    ContainerIdentity {
        id: hostname.to_string(),
        source: IdentitySource::Hostname,
    }
}

/// Extract the short container ID from control group file contents.
///
/// Returns the last path segment of the first line containing a runtime
/// marker, cut to [`SHORT_ID_LEN`] characters. A marked line whose last
/// segment is empty is treated as malformed.
pub fn parse_cgroup(contents: &str) -> Option<String> {
    let line = contents
        .lines()
        .find(|line| RUNTIME_MARKERS.iter().any(|marker| line.contains(marker)))?;

    let segment = line.trim_end().rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }

    Some(segment.chars().take(SHORT_ID_LEN).collect())
}

/// The machine's configured hostname, or "unknown" if it cannot be read.
pub fn local_hostname() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| UNKNOWN.to_string())
}
