//! Container-management daemon lookup.
//!
//! Connects to the daemon once per request, finds the container whose ID
//! starts with the local hostname, and reads its name, image ID and first
//! repository digest. Every failure (daemon disabled, unreachable, API error,
//! no matching container) collapses into [`RuntimeMetadata::Unavailable`].
//!
//! The daemon sits behind [`RuntimeConnector`] and [`ContainerRuntime`] so
//! handlers can be exercised without a live socket.

use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;

use crate::config::{DockerConfig, DIGEST_DISPLAY_LEN, ELLIPSIS, SHORT_ID_LEN};

const SHA256_PREFIX: &str = "sha256:";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Container daemon lookup is disabled")]
    Disabled,

    #[error("Failed to connect to container daemon: {0}")]
    Connect(#[source] bollard::errors::Error),

    #[error("Container daemon request failed: {0}")]
    Api(#[source] bollard::errors::Error),

    #[error("No running container matches hostname {0:?}")]
    NoMatch(String),
}

/// A running container as reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeContainer {
    pub id: String,
    /// Names as reported by the API, each with a leading `/`
    pub names: Vec<String>,
    pub image_id: String,
}

/// Image details as reported by the daemon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeImage {
    pub id: String,
    pub repo_digests: Vec<String>,
}

/// An open connection to a container-management daemon.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn running_containers(&self) -> Result<Vec<RuntimeContainer>, RuntimeError>;

    async fn image(&self, image_id: &str) -> Result<RuntimeImage, RuntimeError>;
}

/// Opens a fresh daemon connection. The connection is dropped when the
/// returned value goes out of scope.
pub trait RuntimeConnector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn ContainerRuntime>, RuntimeError>;
}

/// Connector used when `docker.enabled = false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledConnector;

impl RuntimeConnector for DisabledConnector {
    fn connect(&self) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
        Err(RuntimeError::Disabled)
    }
}

/// Connector for the Docker Engine API.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    socket: Option<String>,
    timeout: Duration,
}

impl DockerConnector {
    pub fn new(config: &DockerConfig) -> Self {
        Self {
            socket: config.socket.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }
}

impl RuntimeConnector for DockerConnector {
    fn connect(&self) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
        let timeout_secs = self.timeout.as_secs();
        let docker = match self.socket.as_deref() {
            None => Docker::connect_with_local_defaults().map(|d| d.with_timeout(self.timeout)),
            Some(addr) if addr.starts_with("tcp://") || addr.starts_with("http://") => {
                Docker::connect_with_http(addr, timeout_secs, bollard::API_DEFAULT_VERSION)
            }
            Some(path) => {
                Docker::connect_with_socket(path, timeout_secs, bollard::API_DEFAULT_VERSION)
            }
        }
        .map_err(RuntimeError::Connect)?;

        Ok(Box::new(DockerRuntime { docker }))
    }
}

struct DockerRuntime {
    docker: Docker,
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn running_containers(&self) -> Result<Vec<RuntimeContainer>, RuntimeError> {
        let summaries = self
            .docker
            .list_containers::<String>(None)
            .await
            .map_err(RuntimeError::Api)?;

        Ok(summaries
            .into_iter()
            .map(|c| RuntimeContainer {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
                image_id: c.image_id.unwrap_or_default(),
            })
            .collect())
    }

    async fn image(&self, image_id: &str) -> Result<RuntimeImage, RuntimeError> {
        let image = self
            .docker
            .inspect_image(image_id)
            .await
            .map_err(RuntimeError::Api)?;

        Ok(RuntimeImage {
            id: image.id.unwrap_or_else(|| image_id.to_string()),
            repo_digests: image.repo_digests.unwrap_or_default(),
        })
    }
}

/// Descriptive metadata for the container this process runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDetails {
    /// Short container ID
    pub container_id: String,
    pub container_name: String,
    /// Short image ID without the `sha256:` prefix
    pub image_id: String,
    /// Display form of the first repository digest, if the image has one
    pub image_digest: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeMetadata {
    Available(ContainerDetails),
    Unavailable,
}

/// Query the daemon for this container's descriptive metadata.
///
/// Single attempt, no retries. The connection is closed before returning
/// regardless of outcome.
pub async fn get_runtime_descriptive_metadata(
    connector: &dyn RuntimeConnector,
    hostname: &str,
) -> RuntimeMetadata {
    match lookup(connector, hostname).await {
        Ok(details) => RuntimeMetadata::Available(details),
        Err(e) => {
            tracing::debug!(error = %e, "Container metadata unavailable");
            RuntimeMetadata::Unavailable
        }
    }
}

async fn lookup(
    connector: &dyn RuntimeConnector,
    hostname: &str,
) -> Result<ContainerDetails, RuntimeError> {
    let runtime = connector.connect()?;
    let containers = runtime.running_containers().await?;

    let container = find_own_container(&containers, hostname)
        .ok_or_else(|| RuntimeError::NoMatch(hostname.to_string()))?;

    let image_digest = match runtime.image(&container.image_id).await {
        Ok(image) => image.repo_digests.first().map(|d| display_digest(d)),
        Err(e) => {
            tracing::debug!(error = %e, image = %container.image_id, "Image inspection failed");
            None
        }
    };

    Ok(ContainerDetails {
        container_id: short_id(&container.id),
        container_name: container_name(container),
        image_id: short_id(&container.image_id),
        image_digest,
    })
}

/// Find the container whose ID starts with the first 12 characters of
/// `hostname`. First match wins; an empty hostname never matches.
pub fn find_own_container<'a>(
    containers: &'a [RuntimeContainer],
    hostname: &str,
) -> Option<&'a RuntimeContainer> {
    let prefix: String = hostname.chars().take(SHORT_ID_LEN).collect();
    if prefix.is_empty() {
        return None;
    }

    containers
        .iter()
        .find(|c| strip_sha256(&c.id).starts_with(&prefix))
}

/// Short identifier: `sha256:` removed, first 12 characters kept.
pub fn short_id(id: &str) -> String {
    strip_sha256(id).chars().take(SHORT_ID_LEN).collect()
}

/// Digest part of a `repo@sha256:...` reference, cut to 19 characters plus an ellipsis.
pub fn display_digest(repo_digest: &str) -> String {
    let digest = repo_digest.rsplit('@').next().unwrap_or(repo_digest);
    let mut display: String = digest.chars().take(DIGEST_DISPLAY_LEN).collect();
    display.push_str(ELLIPSIS);
    display
}

fn strip_sha256(id: &str) -> &str {
    id.strip_prefix(SHA256_PREFIX).unwrap_or(id)
}

fn container_name(container: &RuntimeContainer) -> String {
    container
        .names
        .first()
        .map(|n| n.trim_start_matches('/').to_string())
        .unwrap_or_else(|| short_id(&container.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const OWN_ID: &str = "9a8b7c6d5e4f00112233445566778899aabbccddeeff00112233445566778899";
    const IMAGE_ID: &str = "sha256:1f2e3d4c5b6a79880011223344556677";

    struct FakeRuntime {
        containers: Vec<RuntimeContainer>,
        image: Option<RuntimeImage>,
        drops: Arc<AtomicUsize>,
    }

    impl Drop for FakeRuntime {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn running_containers(&self) -> Result<Vec<RuntimeContainer>, RuntimeError> {
            Ok(self.containers.clone())
        }

        async fn image(&self, image_id: &str) -> Result<RuntimeImage, RuntimeError> {
            self.image
                .clone()
                .ok_or_else(|| RuntimeError::NoMatch(image_id.to_string()))
        }
    }

    struct FakeConnector {
        containers: Vec<RuntimeContainer>,
        image: Option<RuntimeImage>,
        drops: Arc<AtomicUsize>,
    }

    impl FakeConnector {
        fn new(containers: Vec<RuntimeContainer>, image: Option<RuntimeImage>) -> Self {
            Self {
                containers,
                image,
                drops: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl RuntimeConnector for FakeConnector {
        fn connect(&self) -> Result<Box<dyn ContainerRuntime>, RuntimeError> {
            Ok(Box::new(FakeRuntime {
                containers: self.containers.clone(),
                image: self.image.clone(),
                drops: self.drops.clone(),
            }))
        }
    }

    fn own_container() -> RuntimeContainer {
        RuntimeContainer {
            id: OWN_ID.to_string(),
            names: vec!["/web-1".to_string()],
            image_id: IMAGE_ID.to_string(),
        }
    }

    fn other_container() -> RuntimeContainer {
        RuntimeContainer {
            id: "0000aaaa1111bbbb2222".to_string(),
            names: vec!["/db-1".to_string()],
            image_id: "sha256:ffff".to_string(),
        }
    }

    #[test]
    fn test_short_id_strips_prefix() {
        assert_eq!(short_id(IMAGE_ID), "1f2e3d4c5b6a");
        assert_eq!(short_id(OWN_ID), "9a8b7c6d5e4f");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_display_digest() {
        assert_eq!(
            display_digest("ghcr.io/acme/app@sha256:0123456789abcdef0123456789"),
            "sha256:0123456789ab…"
        );
        assert_eq!(display_digest("sha256:01"), "sha256:01…");
    }

    #[test]
    fn test_find_own_container_by_hostname_prefix() {
        let containers = vec![other_container(), own_container()];
        let found = find_own_container(&containers, "9a8b7c6d5e4f").unwrap();
        assert_eq!(found.id, OWN_ID);
    }

    #[test]
    fn test_find_own_container_uses_first_twelve_hostname_chars() {
        let containers = vec![own_container()];
        assert!(find_own_container(&containers, "9a8b7c6d5e4fXYZ").is_some());
    }

    #[test]
    fn test_find_own_container_no_match() {
        let containers = vec![other_container()];
        assert!(find_own_container(&containers, "devbox").is_none());
        assert!(find_own_container(&containers, "").is_none());
    }

    #[tokio::test]
    async fn test_disabled_connector_is_unavailable() {
        let metadata = get_runtime_descriptive_metadata(&DisabledConnector, "9a8b7c6d5e4f").await;
        assert_eq!(metadata, RuntimeMetadata::Unavailable);
    }

    #[tokio::test]
    async fn test_unreachable_socket_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("docker.sock");
        let connector = DockerConnector::new(&DockerConfig {
            enabled: true,
            socket: Some(socket.to_string_lossy().to_string()),
            timeout_seconds: 2,
        });
        let metadata = get_runtime_descriptive_metadata(&connector, "9a8b7c6d5e4f").await;
        assert_eq!(metadata, RuntimeMetadata::Unavailable);
    }

    #[tokio::test]
    async fn test_matched_container_with_digest() {
        let connector = FakeConnector::new(
            vec![other_container(), own_container()],
            Some(RuntimeImage {
                id: IMAGE_ID.to_string(),
                repo_digests: vec![
                    "ghcr.io/acme/app@sha256:feedfacecafebeef0000".to_string(),
                    "ghcr.io/acme/app@sha256:ignored".to_string(),
                ],
            }),
        );
        let metadata = get_runtime_descriptive_metadata(&connector, "9a8b7c6d5e4f").await;
        assert_eq!(
            metadata,
            RuntimeMetadata::Available(ContainerDetails {
                container_id: "9a8b7c6d5e4f".to_string(),
                container_name: "web-1".to_string(),
                image_id: "1f2e3d4c5b6a".to_string(),
                image_digest: Some("sha256:feedfacecafe…".to_string()),
            })
        );
    }

    #[tokio::test]
    async fn test_matched_container_without_digest() {
        let connector = FakeConnector::new(
            vec![own_container()],
            Some(RuntimeImage {
                id: IMAGE_ID.to_string(),
                repo_digests: vec![],
            }),
        );
        match get_runtime_descriptive_metadata(&connector, "9a8b7c6d5e4f").await {
            RuntimeMetadata::Available(details) => assert_eq!(details.image_digest, None),
            other => panic!("expected metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_image_inspection_failure_keeps_container_details() {
        let connector = FakeConnector::new(vec![own_container()], None);
        match get_runtime_descriptive_metadata(&connector, "9a8b7c6d5e4f").await {
            RuntimeMetadata::Available(details) => {
                assert_eq!(details.container_name, "web-1");
                assert_eq!(details.image_id, "1f2e3d4c5b6a");
                assert_eq!(details.image_digest, None);
            }
            other => panic!("expected metadata, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_matching_container_is_unavailable() {
        let connector = FakeConnector::new(vec![other_container()], None);
        let metadata = get_runtime_descriptive_metadata(&connector, "devbox").await;
        assert_eq!(metadata, RuntimeMetadata::Unavailable);
    }

    #[tokio::test]
    async fn test_connection_closed_on_success_and_failure() {
        let found = FakeConnector::new(vec![own_container()], None);
        get_runtime_descriptive_metadata(&found, "9a8b7c6d5e4f").await;
        assert_eq!(found.drops.load(Ordering::SeqCst), 1);

        let missing = FakeConnector::new(vec![], None);
        get_runtime_descriptive_metadata(&missing, "9a8b7c6d5e4f").await;
        assert_eq!(missing.drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_container_name_falls_back_to_short_id() {
        let container = RuntimeContainer {
            id: OWN_ID.to_string(),
            names: vec![],
            image_id: IMAGE_ID.to_string(),
        };
        assert_eq!(container_name(&container), "9a8b7c6d5e4f");
    }
}
