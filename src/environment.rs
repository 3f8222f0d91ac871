//! Runtime environment detection, reported by the environment endpoint.

use serde::Serialize;
use std::path::Path;

pub const DEPLOYMENT_MODE_ENV_VAR: &str = "DEPLOYMENT_MODE";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub deployment_mode: String,
    pub version: String,
    pub git_hash: String,
    /// Seconds since the server started.
    #[serde(rename = "uptime")]
    pub uptime_seconds: u64,
}

/// "docker" when running in a container, "local" otherwise. The
/// DEPLOYMENT_MODE environment variable takes precedence.
pub fn detect_deployment_mode() -> String {
    deployment_mode_from(
        std::env::var(DEPLOYMENT_MODE_ENV_VAR).ok(),
        Path::new("/"),
    )
}

fn deployment_mode_from(explicit: Option<String>, root: &Path) -> String {
    if let Some(mode) = explicit.filter(|m| !m.trim().is_empty()) {
        return mode.trim().to_lowercase();
    }
    if root.join(".dockerenv").exists() {
        return "docker".to_string();
    }
    let in_docker_cgroup = std::fs::read_to_string(root.join("proc/1/cgroup"))
        .map(|cgroup| cgroup.lines().any(|line| line.contains("docker")))
        .unwrap_or(false);
    if in_docker_cgroup {
        return "docker".to_string();
    }
    "local".to_string()
}
