// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Resource limits applied to a Siril session.
//!
//! Siril sizes its thread pool and stacking buffers from the machine it runs
//! on, which overshoots inside containers. [`SirilResource`] describes the
//! limits a session should impose; `container_aware_limits` reads them from
//! the cgroup filesystem when one is in effect.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Resource limits for a session.
///
/// `memory_limit_gb` takes precedence over `memory_percent` when both are
/// set: the session switches Siril to fixed-amount memory mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SirilResource {
    /// Maximum number of processing threads, if limited.
    pub cpu_limit: Option<u32>,
    /// Absolute memory ceiling in GB, if limited.
    pub memory_limit_gb: Option<f64>,
    /// Ratio of free memory Siril may use when no absolute ceiling is set.
    pub memory_percent: f64,
}

impl Default for SirilResource {
    fn default() -> Self {
        Self {
            cpu_limit: None,
            memory_limit_gb: None,
            memory_percent: 0.9,
        }
    }
}

impl SirilResource {
    /// No explicit limits; Siril uses 90% of free memory.
    pub fn default_limits() -> Self {
        Self::default()
    }

    /// Derive limits from the current cgroup, for containerized runs.
    /// Fields stay unset when no corresponding limit is in effect.
    pub fn container_aware_limits() -> Self {
        Self {
            cpu_limit: container_cpu_limit(),
            memory_limit_gb: container_memory_limit_gb(),
            ..Self::default()
        }
    }
}

/// CPU limit from the cgroup v2 `cpu.max` quota, falling back to v1.
/// Quotas round up: a 1.5-CPU quota gives Siril 2 threads.
fn container_cpu_limit() -> Option<u32> {
    container_cpu_limit_at(Path::new("/sys/fs/cgroup"))
}

fn container_cpu_limit_at(root: &Path) -> Option<u32> {
    // cgroup v2: "max 100000" or "<quota> <period>"
    if let Ok(raw) = std::fs::read_to_string(root.join("cpu.max")) {
        let mut parts = raw.split_whitespace();
        let quota = parts.next()?;
        if quota == "max" {
            return None;
        }
        let quota: f64 = quota.parse().ok()?;
        let period: f64 = parts.next()?.parse().ok()?;
        let cpus = (quota / period).ceil() as u32;
        debug!(cpus, "container cpu limit from cgroup v2");
        return Some(cpus.max(1));
    }

    // cgroup v1: separate quota/period files, quota -1 when unlimited
    let quota: f64 = std::fs::read_to_string(root.join("cpu/cpu.cfs_quota_us"))
        .ok()?
        .trim()
        .parse()
        .ok()?;
    if quota < 0.0 {
        return None;
    }
    let period: f64 = std::fs::read_to_string(root.join("cpu/cpu.cfs_period_us"))
        .ok()?
        .trim()
        .parse()
        .ok()?;
    let cpus = (quota / period).ceil() as u32;
    debug!(cpus, "container cpu limit from cgroup v1");
    Some(cpus.max(1))
}

/// Memory ceiling in GB from cgroup v2 `memory.max`, falling back to v1.
fn container_memory_limit_gb() -> Option<f64> {
    container_memory_limit_gb_at(Path::new("/sys/fs/cgroup"))
}

fn container_memory_limit_gb_at(root: &Path) -> Option<f64> {
    let raw = std::fs::read_to_string(root.join("memory.max"))
        .or_else(|_| std::fs::read_to_string(root.join("memory/memory.limit_in_bytes")))
        .ok()?;
    let raw = raw.trim();
    if raw == "max" {
        return None;
    }
    let bytes: u64 = raw.parse().ok()?;
    // v1 reports an absurdly large number instead of "max" when unlimited
    if bytes >= u64::MAX / 2 {
        return None;
    }
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    debug!(gb, "container memory limit from cgroup");
    Some(gb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let resource = SirilResource::default_limits();
        assert_eq!(resource.cpu_limit, None);
        assert_eq!(resource.memory_limit_gb, None);
        assert!((resource.memory_percent - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn test_custom_limits() {
        let resource = SirilResource {
            cpu_limit: Some(4),
            memory_limit_gb: Some(8.0),
            memory_percent: 0.75,
        };
        assert_eq!(resource.cpu_limit, Some(4));
        assert_eq!(resource.memory_limit_gb, Some(8.0));
    }

    #[test]
    fn test_cgroup_v2_cpu_quota() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cpu.max"), "150000 100000\n").unwrap();
        assert_eq!(container_cpu_limit_at(dir.path()), Some(2));
    }

    #[test]
    fn test_cgroup_v2_cpu_unlimited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("cpu.max"), "max 100000\n").unwrap();
        assert_eq!(container_cpu_limit_at(dir.path()), None);
    }

    #[test]
    fn test_cgroup_v1_cpu_quota() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cpu")).unwrap();
        std::fs::write(dir.path().join("cpu/cpu.cfs_quota_us"), "400000\n").unwrap();
        std::fs::write(dir.path().join("cpu/cpu.cfs_period_us"), "100000\n").unwrap();
        assert_eq!(container_cpu_limit_at(dir.path()), Some(4));
    }

    #[test]
    fn test_cgroup_v1_cpu_unlimited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("cpu")).unwrap();
        std::fs::write(dir.path().join("cpu/cpu.cfs_quota_us"), "-1\n").unwrap();
        std::fs::write(dir.path().join("cpu/cpu.cfs_period_us"), "100000\n").unwrap();
        assert_eq!(container_cpu_limit_at(dir.path()), None);
    }

    #[test]
    fn test_cgroup_v2_memory_limit() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.max"), "4294967296\n").unwrap();
        assert_eq!(container_memory_limit_gb_at(dir.path()), Some(4.0));
    }

    #[test]
    fn test_cgroup_v2_memory_unlimited() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("memory.max"), "max\n").unwrap();
        assert_eq!(container_memory_limit_gb_at(dir.path()), None);
    }

    #[test]
    fn test_missing_cgroup_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(container_cpu_limit_at(dir.path()), None);
        assert_eq!(container_memory_limit_gb_at(dir.path()), None);
    }
}
