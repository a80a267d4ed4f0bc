//! Locating an installed runtime that satisfies the target.
//!
//! Candidates come from three sources, in priority order: a version-aware
//! launcher asked for the exact `major.minor`, generic interpreter names on
//! the search path, and a scan of well-known install roots. Paths are
//! deduplicated by canonical path before probing, and probe failures only
//! remove a candidate from consideration.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shell::{ProcessRunner, SearchPath};

use super::layout::HostLayout;
use super::probe::{probe, RuntimeCandidate};
use super::version::{RuntimeVersion, TargetSpec};

/// Finds the best installed runtime for a target.
pub struct VersionResolver<'a> {
    runner: &'a dyn ProcessRunner,
    layout: &'a HostLayout,
    search_path: &'a SearchPath,
}

impl<'a> VersionResolver<'a> {
    pub fn new(
        runner: &'a dyn ProcessRunner,
        layout: &'a HostLayout,
        search_path: &'a SearchPath,
    ) -> Self {
        Self {
            runner,
            layout,
            search_path,
        }
    }

    /// Candidate executable paths in discovery order, without duplicates.
    pub fn discover(&self, version: &RuntimeVersion) -> Vec<PathBuf> {
        let mut found = Vec::new();

        if let Some(path) = self.query_launcher(version) {
            found.push(path);
        }

        for name in self.layout.interpreter_names() {
            if let Some(path) = self.search_path.resolve(name) {
                found.push(path);
            }
        }

        found.extend(self.scan_install_roots());

        dedup_by_canonical(found)
    }

    /// The best existing runtime for `target`, if any.
    ///
    /// Finding nothing is not an error; the caller decides whether to
    /// install.
    pub fn resolve(&self, target: &TargetSpec) -> Option<RuntimeCandidate> {
        let candidates: Vec<RuntimeCandidate> = self
            .discover(&target.version)
            .iter()
            .filter_map(|path| probe(self.runner, path))
            .collect();

        tracing::debug!(
            "Probed {} runtime candidate(s) for {}",
            candidates.len(),
            target.version
        );

        select_best(candidates, &target.version)
    }

    /// Re-resolve after an install, checking `expected_dir` before the
    /// general discovery.
    pub fn resolve_after_install(
        &self,
        target: &TargetSpec,
        expected_dir: Option<&Path>,
    ) -> Option<RuntimeCandidate> {
        if let Some(dir) = expected_dir {
            let in_dir = self
                .layout
                .interpreter_names()
                .iter()
                .map(|name| dir.join(name))
                .filter(|path| path.is_file())
                .filter_map(|path| probe(self.runner, &path))
                .collect();
            if let Some(best) = select_best(in_dir, &target.version) {
                return Some(best);
            }
            tracing::debug!(
                "No runtime in expected directory {}, falling back to discovery",
                dir.display()
            );
        }
        self.resolve(target)
    }

    fn query_launcher(&self, version: &RuntimeVersion) -> Option<PathBuf> {
        let spec = self.layout.launcher_query(version).search_path(self.search_path);
        let result = self.runner.run(&spec).ok().filter(|r| r.success)?;
        result
            .stdout
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(PathBuf::from)
    }

    fn scan_install_roots(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for root in self.layout.scan_roots() {
            let Ok(entries) = fs::read_dir(&root.dir) else {
                continue;
            };
            let mut matches: Vec<PathBuf> = entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.file_name()
                        .to_str()
                        .is_some_and(|name| root.pattern.is_match(name))
                })
                .map(|e| e.path().join(&root.executable))
                .filter(|exe| exe.is_file())
                .collect();
            matches.sort();
            found.extend(matches);
        }
        found
    }
}

/// Pick the highest compatible version; ties keep the earliest candidate.
pub fn select_best(
    candidates: Vec<RuntimeCandidate>,
    target: &RuntimeVersion,
) -> Option<RuntimeCandidate> {
    let mut best: Option<RuntimeCandidate> = None;
    for candidate in candidates {
        if !candidate.version.satisfies(target) {
            continue;
        }
        match &best {
            Some(current) if candidate.version <= current.version => {}
            _ => best = Some(candidate),
        }
    }
    best
}

fn dedup_by_canonical(paths: Vec<PathBuf>) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    paths
        .into_iter()
        .filter(|path| {
            let key = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            seen.insert(key)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::version::{Architecture, InstallScope};
    use crate::shell::{MockRunner, OsFamily};
    use tempfile::TempDir;

    fn candidate(path: &str, version: (u32, u32, u32)) -> RuntimeCandidate {
        RuntimeCandidate {
            executable: PathBuf::from(path),
            version: RuntimeVersion::new(version.0, version.1, version.2),
        }
    }

    fn target() -> TargetSpec {
        TargetSpec {
            version: RuntimeVersion::new(3, 11, 9),
            arch: Architecture::Amd64,
            scope: InstallScope::CurrentUser,
        }
    }

    fn linux_layout(home: &Path) -> HostLayout {
        HostLayout::with_env(
            OsFamily::Linux,
            |_| Err(std::env::VarError::NotPresent),
            Some(home.to_path_buf()),
            std::env::temp_dir(),
        )
    }

    fn fake_exe(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "#!/bin/sh\n").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn select_best_prefers_highest_compatible() {
        let best = select_best(
            vec![
                candidate("/a", (3, 11, 9)),
                candidate("/b", (3, 12, 4)),
                candidate("/c", (3, 11, 12)),
                candidate("/d", (3, 11, 4)),
            ],
            &RuntimeVersion::new(3, 11, 9),
        )
        .unwrap();
        assert_eq!(best.executable, PathBuf::from("/c"));
    }

    #[test]
    fn select_best_breaks_ties_by_discovery_order() {
        let best = select_best(
            vec![candidate("/first", (3, 11, 9)), candidate("/second", (3, 11, 9))],
            &RuntimeVersion::new(3, 11, 9),
        )
        .unwrap();
        assert_eq!(best.executable, PathBuf::from("/first"));
    }

    #[test]
    fn select_best_returns_none_without_match() {
        assert!(select_best(
            vec![candidate("/a", (3, 10, 14)), candidate("/b", (3, 12, 0))],
            &RuntimeVersion::new(3, 11, 9),
        )
        .is_none());
        assert!(select_best(Vec::new(), &RuntimeVersion::new(3, 11, 9)).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_probes_duplicates_once_and_skips_unparsable() {
        let temp = TempDir::new().unwrap();
        let bin = temp.path().join("bin");
        fake_exe(&bin.join("python3"));
        std::os::unix::fs::symlink(bin.join("python3"), bin.join("python")).unwrap();

        let layout = linux_layout(temp.path());
        let path = SearchPath::from_entries(vec![bin.clone()]);
        let runner = MockRunner::new();
        runner
            .respond("python3.11 -c", 0, &format!("{}\n", bin.join("python3").display()))
            .respond("python3 --version", 0, "Python 3.11.9");

        let resolver = VersionResolver::new(&runner, &layout, &path);
        let best = resolver.resolve(&target()).unwrap();

        assert_eq!(best.executable, bin.join("python3"));
        let probes = runner
            .calls()
            .into_iter()
            .filter(|c| c.ends_with("--version"))
            .count();
        assert_eq!(probes, 1);
    }

    #[cfg(unix)]
    #[test]
    fn resolve_scans_pyenv_versions() {
        let temp = TempDir::new().unwrap();
        let versions = temp.path().join(".pyenv").join("versions");
        fake_exe(&versions.join("3.11.12").join("bin").join("python3"));
        fake_exe(&versions.join("3.10.14").join("bin").join("python3"));
        fs::create_dir_all(versions.join("system")).unwrap();

        let layout = linux_layout(temp.path());
        let path = SearchPath::default();
        let runner = MockRunner::new();
        runner
            .respond("3.11.12/bin/python3 --version", 0, "Python 3.11.12")
            .respond("3.10.14/bin/python3 --version", 0, "Python 3.10.14");

        let resolver = VersionResolver::new(&runner, &layout, &path);
        let best = resolver.resolve(&target()).unwrap();
        assert_eq!(best.version, RuntimeVersion::new(3, 11, 12));
    }

    #[test]
    fn resolve_returns_none_when_nothing_qualifies() {
        let temp = TempDir::new().unwrap();
        let layout = linux_layout(temp.path());
        let path = SearchPath::default();
        let runner = MockRunner::new();
        runner.respond("python3.11 -c", 1, "");

        let resolver = VersionResolver::new(&runner, &layout, &path);
        assert!(resolver.resolve(&target()).is_none());
    }

    #[test]
    fn resolve_after_install_checks_expected_dir_first() {
        let temp = TempDir::new().unwrap();
        let expected = temp.path().join("Versions").join("3.11").join("bin");
        fake_exe(&expected.join("python3"));

        let layout = linux_layout(temp.path());
        let path = SearchPath::default();
        let runner = MockRunner::new();
        runner.respond("python3 --version", 0, "Python 3.11.9");

        let resolver = VersionResolver::new(&runner, &layout, &path);
        let found = resolver
            .resolve_after_install(&target(), Some(&expected))
            .unwrap();
        assert_eq!(found.executable, expected.join("python3"));
        assert!(!runner.was_called("python3.11 -c"));
    }

    #[test]
    fn dedup_keeps_first_occurrence() {
        let paths = dedup_by_canonical(vec![
            PathBuf::from("/nonexistent/a"),
            PathBuf::from("/nonexistent/b"),
            PathBuf::from("/nonexistent/a"),
        ]);
        assert_eq!(
            paths,
            vec![PathBuf::from("/nonexistent/a"), PathBuf::from("/nonexistent/b")]
        );
    }
}
