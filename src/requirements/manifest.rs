//! Requirements manifest parsing and pin validation.
//!
//! Every installable line must pin an exact version (`==`), a direct
//! reference (`@`) or a content hash (`--hash=`). Blank lines, comments and
//! pip directives (`-r`, `--index-url`, hash continuation lines) are exempt.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ProvisionError, Result};

/// Classification of one manifest line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequirementKind {
    Blank,
    Comment,
    Directive,
    Pinned,
    Unpinned,
}

impl RequirementKind {
    /// Classify a raw manifest line.
    pub fn classify(raw: &str) -> Self {
        let line = raw.trim();
        if line.is_empty() {
            return RequirementKind::Blank;
        }
        if line.starts_with('#') {
            return RequirementKind::Comment;
        }
        if line.starts_with('-') {
            return RequirementKind::Directive;
        }

        // Environment markers after `;` say nothing about the version.
        let uncommented = line.split(" #").next().unwrap_or(line);
        let requirement = uncommented.split(';').next().unwrap_or(uncommented);
        if requirement.contains("==") || requirement.contains('@') || uncommented.contains("--hash=")
        {
            RequirementKind::Pinned
        } else {
            RequirementKind::Unpinned
        }
    }
}

/// One numbered line of a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementLine {
    /// 1-based line number.
    pub line_number: usize,
    pub raw: String,
    pub kind: RequirementKind,
}

/// Whether unpinned lines abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinPolicy {
    #[default]
    Enforce,
    AllowUnpinned,
}

impl PinPolicy {
    pub fn from_allow_unpinned(allow: bool) -> Self {
        if allow {
            PinPolicy::AllowUnpinned
        } else {
            PinPolicy::Enforce
        }
    }
}

/// A parsed requirements manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    lines: Vec<RequirementLine>,
}

impl Manifest {
    /// Read and parse the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ProvisionError::preflight(format!(
                "requirements manifest not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)?;
        Ok(Self::parse(path, &content))
    }

    /// Parse manifest text attributed to `path`.
    pub fn parse(path: &Path, content: &str) -> Self {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let lines = content
            .lines()
            .enumerate()
            .map(|(i, raw)| RequirementLine {
                line_number: i + 1,
                raw: raw.to_string(),
                kind: RequirementKind::classify(raw),
            })
            .collect();
        Self {
            path: path.to_path_buf(),
            lines,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[RequirementLine] {
        &self.lines
    }

    /// Lines that carry no pin.
    pub fn unpinned(&self) -> impl Iterator<Item = &RequirementLine> {
        self.lines
            .iter()
            .filter(|l| l.kind == RequirementKind::Unpinned)
    }

    /// Apply `policy`, failing on the first unpinned line when enforced.
    pub fn validate(self, policy: PinPolicy) -> Result<ValidatedManifest> {
        let unpinned: Vec<RequirementLine> = self.unpinned().cloned().collect();

        if policy == PinPolicy::Enforce {
            if let Some(first) = unpinned.first() {
                return Err(ProvisionError::UnpinnedRequirement {
                    path: self.path.clone(),
                    line_number: first.line_number,
                    line: first.raw.trim().to_string(),
                });
            }
        }

        Ok(ValidatedManifest {
            path: self.path,
            unpinned,
        })
    }
}

/// A manifest that has passed pin validation.
///
/// Only obtainable from [`Manifest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedManifest {
    path: PathBuf,
    unpinned: Vec<RequirementLine>,
}

impl ValidatedManifest {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory pip runs in, so relative references in the manifest resolve.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    /// Unpinned lines tolerated by an override.
    pub fn tolerated(&self) -> &[RequirementLine] {
        &self.unpinned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn classifies_each_kind() {
        use RequirementKind::*;
        let cases = [
            ("", Blank),
            ("   ", Blank),
            ("# comment", Comment),
            ("   # indented comment", Comment),
            ("-r base.txt", Directive),
            ("--index-url https://example.org/simple", Directive),
            ("    --hash=sha256:abcd", Directive),
            ("requests==2.31.0", Pinned),
            ("pywin32==306 ; sys_platform == 'win32'", Pinned),
            ("mypkg @ https://example.org/mypkg-1.0.tar.gz", Pinned),
            ("requests --hash=sha256:abcd", Pinned),
            ("requests", Unpinned),
            ("requests>=2.0", Unpinned),
            ("requests~=2.31", Unpinned),
            ("requests # pinned==later", Unpinned),
            ("pywin32>=306 ; sys_platform == \"win32\"", Unpinned),
            ("requests ; python_version == \"3.11\"", Unpinned),
            ("requests;python_version=='3.11'", Unpinned),
            ("attrs>=23 ; python_version > '3' --hash=sha256:abcd", Pinned),
        ];
        for (line, expected) in cases {
            assert_eq!(RequirementKind::classify(line), expected, "line: {:?}", line);
        }
    }

    #[test]
    fn validate_names_first_unpinned_line() {
        let manifest = Manifest::parse(
            Path::new("/app/requirements.txt"),
            "# deps\nnumpy==1.26.4\n\nrequests>=2.0\nflask\n",
        );

        let err = manifest.validate(PinPolicy::Enforce).unwrap_err();
        match err {
            ProvisionError::UnpinnedRequirement {
                line_number, line, ..
            } => {
                assert_eq!(line_number, 4);
                assert_eq!(line, "requests>=2.0");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn fully_pinned_manifest_validates() {
        let manifest = Manifest::parse(
            Path::new("/app/requirements.txt"),
            "numpy==1.26.4\n-r more.txt\n# end\n",
        );
        let validated = manifest.validate(PinPolicy::Enforce).unwrap();
        assert!(validated.tolerated().is_empty());
        assert_eq!(validated.dir(), Path::new("/app"));
    }

    #[test]
    fn leading_byte_order_mark_is_ignored() {
        let manifest = Manifest::parse(
            Path::new("/app/requirements.txt"),
            "\u{feff}# deps\nnumpy==1.26.4\n",
        );
        assert_eq!(manifest.lines()[0].kind, RequirementKind::Comment);
        assert_eq!(manifest.lines()[0].raw, "# deps");
        assert!(manifest.validate(PinPolicy::Enforce).is_ok());
    }

    #[test]
    fn override_keeps_unpinned_for_warnings() {
        let manifest = Manifest::parse(Path::new("req.txt"), "flask\nnumpy==1.26.4\nrich\n");
        let validated = manifest.validate(PinPolicy::AllowUnpinned).unwrap();
        let numbers: Vec<usize> = validated.tolerated().iter().map(|l| l.line_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn load_missing_manifest_is_preflight_error() {
        let temp = TempDir::new().unwrap();
        let err = Manifest::load(&temp.path().join("requirements.txt")).unwrap_err();
        assert!(matches!(err, ProvisionError::Preflight { .. }));
    }

    #[test]
    fn load_reads_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("requirements.txt");
        fs::write(&path, "numpy==1.26.4\r\nrequests\r\n").unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.lines().len(), 2);
        assert_eq!(manifest.unpinned().count(), 1);
    }
}
