//! Process table scanning and install-directory matching.

use crate::error::{FusionError, Result};
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::{debug, trace};

/// One row of a process table snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    /// Process name as reported by the OS (e.g. `steam.exe`).
    pub name: String,
    /// Resolved executable path; `None` when the OS refused to tell us.
    pub exe: Option<PathBuf>,
}

/// A running process that matched a target directory.
///
/// Handles are resolved fresh on every scan and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub exe: PathBuf,
}

/// Source of process table snapshots.
pub trait ProcessTable: Send + Sync {
    fn snapshot(&self) -> Vec<ProcessEntry>;
}

/// Process table backed by `sysinfo`.
///
/// Executable paths are queried best-effort: processes the current user may
/// not inspect simply come back without a path.
pub struct SystemProcessTable {
    system: Mutex<System>,
}

impl SystemProcessTable {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for SystemProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessTable for SystemProcessTable {
    fn snapshot(&self) -> Vec<ProcessEntry> {
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::new().with_exe(UpdateKind::Always),
        );

        system
            .processes()
            .iter()
            .map(|(pid, process)| ProcessEntry {
                pid: pid.as_u32(),
                name: process.name().to_string_lossy().into_owned(),
                exe: process.exe().map(Path::to_path_buf),
            })
            .collect()
    }
}

/// How a candidate executable directory is compared with the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// The executable lives directly in the target directory.
    #[default]
    ExactDirectory,
    /// The executable lives in the target directory or any directory beneath
    /// it. Matching respects path boundaries, so `Foo` never matches `FooBar`.
    WithinDirectory,
}

/// An absolute directory with a case-insensitive comparison key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetDirectory {
    path: PathBuf,
    key: String,
}

impl TargetDirectory {
    /// Normalize `path` to an absolute path without a trailing separator.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(FusionError::Other("Target directory is empty".into()));
        }

        let absolute =
            std::path::absolute(path).map_err(|e| FusionError::io_with_path(e, path))?;
        let normalized = normalize_lexically(&absolute);
        let key = comparison_key(&normalized);

        Ok(Self {
            path: normalized,
            key,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `directory` satisfies `policy` against this target.
    pub fn matches(&self, directory: &Path, policy: MatchPolicy) -> bool {
        let Ok(candidate) = std::path::absolute(directory) else {
            return false;
        };
        let candidate = comparison_key(&normalize_lexically(&candidate));

        match policy {
            MatchPolicy::ExactDirectory => candidate == self.key,
            MatchPolicy::WithinDirectory => {
                if candidate == self.key {
                    return true;
                }
                let prefix = if self.key.ends_with('/') {
                    self.key.clone()
                } else {
                    format!("{}/", self.key)
                };
                candidate.starts_with(&prefix)
            }
        }
    }
}

/// Resolve `.` and `..` without touching the file system.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Lowercased, forward-slash form with trailing separators stripped.
fn comparison_key(path: &Path) -> String {
    let unified = path.to_string_lossy().replace('\\', "/");
    let trimmed = unified.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Something that can report whether "the" process is currently running.
pub trait ProcessProbe: Send + Sync {
    fn find_matching_process(&self) -> Option<ProcessHandle>;
}

/// Finds a running process whose executable resides in a target directory.
pub struct ProcessMatcher {
    target: TargetDirectory,
    policy: MatchPolicy,
    table: Arc<dyn ProcessTable>,
}

impl ProcessMatcher {
    pub fn new(target: TargetDirectory, table: Arc<dyn ProcessTable>) -> Self {
        Self {
            target,
            policy: MatchPolicy::default(),
            table,
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn target(&self) -> &TargetDirectory {
        &self.target
    }

    /// Scan one snapshot and return the first match.
    pub fn find_in(&self, processes: &[ProcessEntry]) -> Option<ProcessHandle> {
        for process in processes {
            let Some(exe) = process.exe.as_deref() else {
                trace!("Process {}: could not resolve executable path", process.pid);
                continue;
            };

            let Some(directory) = exe.parent().filter(|d| !d.as_os_str().is_empty()) else {
                trace!(
                    "Process {}: no directory in path {}",
                    process.pid,
                    exe.display()
                );
                continue;
            };

            if self.target.matches(directory, self.policy) {
                debug!(
                    "Found matching process {} at {}",
                    process.pid,
                    exe.display()
                );
                return Some(ProcessHandle {
                    pid: process.pid,
                    exe: exe.to_path_buf(),
                });
            }
        }

        None
    }
}

impl ProcessProbe for ProcessMatcher {
    fn find_matching_process(&self) -> Option<ProcessHandle> {
        let processes = self.table.snapshot();
        debug!("Scanning {} running processes", processes.len());

        let found = self.find_in(&processes);
        if found.is_none() {
            debug!("No process running from {}", self.target.path().display());
        }
        found
    }
}

/// Whether any process whose name stem equals `stem` (case-insensitive) is running.
pub fn is_running_by_name(table: &dyn ProcessTable, stem: &str) -> bool {
    table.snapshot().iter().any(|process| {
        let name = Path::new(&process.name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| process.name.clone());
        name.eq_ignore_ascii_case(stem)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTable(Vec<ProcessEntry>);

    impl ProcessTable for FixedTable {
        fn snapshot(&self) -> Vec<ProcessEntry> {
            self.0.clone()
        }
    }

    fn entry(pid: u32, exe: Option<&str>) -> ProcessEntry {
        ProcessEntry {
            pid,
            name: exe
                .and_then(|e| Path::new(e).file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            exe: exe.map(PathBuf::from),
        }
    }

    fn matcher(target: &str, processes: Vec<ProcessEntry>) -> ProcessMatcher {
        ProcessMatcher::new(
            TargetDirectory::new(target).unwrap(),
            Arc::new(FixedTable(processes)),
        )
    }

    #[test]
    fn test_target_directory_strips_trailing_separator() {
        let target = TargetDirectory::new("/games/portal/").unwrap();
        assert_eq!(target.path(), Path::new("/games/portal"));
    }

    #[test]
    fn test_target_directory_resolves_dot_segments() {
        let target = TargetDirectory::new("/games/./other/../portal").unwrap();
        assert_eq!(target.path(), Path::new("/games/portal"));
    }

    #[test]
    fn test_empty_target_rejected() {
        assert!(TargetDirectory::new("").is_err());
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let m = matcher("/Games/Portal", vec![entry(10, Some("/games/PORTAL/portal.exe"))]);
        assert_eq!(m.find_matching_process().map(|p| p.pid), Some(10));
    }

    #[test]
    fn test_unresolvable_paths_are_skipped() {
        let m = matcher(
            "/games/portal",
            vec![
                entry(1, None),
                entry(2, Some("portal.exe")),
                entry(3, Some("/games/portal/portal.exe")),
            ],
        );
        assert_eq!(m.find_matching_process().map(|p| p.pid), Some(3));
    }

    #[test]
    fn test_no_match_returns_none() {
        let m = matcher(
            "/games/portal",
            vec![entry(1, None), entry(2, Some("/usr/bin/bash"))],
        );
        assert!(m.find_matching_process().is_none());
    }

    #[test]
    fn test_exact_policy_ignores_subdirectories() {
        let m = matcher("/games/portal", vec![entry(5, Some("/games/portal/bin/portal.exe"))]);
        assert!(m.find_matching_process().is_none());
    }

    #[test]
    fn test_within_policy_matches_subdirectories() {
        let m = matcher("/games/portal", vec![entry(5, Some("/games/portal/bin/portal.exe"))])
            .with_policy(MatchPolicy::WithinDirectory);
        assert_eq!(m.find_matching_process().map(|p| p.pid), Some(5));
    }

    #[test]
    fn test_within_policy_respects_path_boundary() {
        let m = matcher("/games/foo", vec![entry(7, Some("/games/foobar/foo.exe"))])
            .with_policy(MatchPolicy::WithinDirectory);
        assert!(m.find_matching_process().is_none());
    }

    #[test]
    fn test_backslash_separators_compare_equal() {
        let target = TargetDirectory::new("/games/portal").unwrap();
        assert!(target.matches(Path::new("/games\\portal\\"), MatchPolicy::ExactDirectory));
    }

    #[test]
    fn test_is_running_by_name() {
        let table = FixedTable(vec![
            entry(1, Some("/opt/steam/Steam.exe")),
            entry(2, Some("/usr/bin/bash")),
        ]);
        assert!(is_running_by_name(&table, "steam"));
        assert!(!is_running_by_name(&table, "portal"));
    }

    #[test]
    fn test_system_table_lists_current_process() {
        let table = SystemProcessTable::new();
        let own_pid = std::process::id();
        assert!(table.snapshot().iter().any(|p| p.pid == own_pid));
    }
}
