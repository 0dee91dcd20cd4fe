// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! File staging
//!
//! Materialises a package's source tree inside its working directory,
//! following the destination mapping. Copies merge into whatever is already
//! there.

use glob::{MatchOptions, Pattern};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::mapping::plan_copy;
use crate::utils::relative_to_base;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

#[derive(Debug, Clone)]
struct Rule {
    pattern: Pattern,
    /// Matched against the whole copy-relative path
    anchored: bool,
    /// Trailing path components the pattern spans when not anchored
    components: usize,
    dir_only: bool,
}

impl Rule {
    fn subject<'p>(&self, relative: &'p str) -> Option<&'p str> {
        if self.anchored {
            return Some(relative);
        }
        let skip = relative.split('/').count().checked_sub(self.components)?;
        let mut tail = relative;
        for _ in 0..skip {
            tail = tail.split_once('/').map_or("", |(_, rest)| rest);
        }
        Some(tail)
    }
}

/// Glob patterns for entries left out of a copy
///
/// - `*.pyc` matches any entry whose name matches, at any depth
/// - `/conf` matches relative to the copy root only
/// - `lib/conf` matches the trailing segments of a path at any depth
/// - a trailing `/` restricts the pattern to directories
///
/// An excluded directory is skipped along with everything below it.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    rules: Vec<Rule>,
}

impl ExclusionSet {
    pub fn new<I, S>(patterns: I) -> StowageResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }

            let dir_only = raw.ends_with('/');
            let trimmed = raw.trim_end_matches('/');
            let anchored = trimmed.starts_with('/');
            let trimmed = trimmed.trim_start_matches('/');
            let pattern = Pattern::new(trimmed)?;

            rules.push(Rule {
                pattern,
                anchored,
                components: trimmed.split('/').count(),
                dir_only,
            });
        }
        Ok(Self { rules })
    }

    /// Whether an entry at `relative` (`/`-separated, below the copy root)
    /// is excluded
    pub fn is_excluded(&self, relative: &str, is_dir: bool) -> bool {
        self.rules.iter().any(|rule| {
            if rule.dir_only && !is_dir {
                return false;
            }
            rule.subject(relative)
                .is_some_and(|subject| rule.pattern.matches_with(subject, MATCH_OPTIONS))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn copy_error(what: &str, path: &Path, e: impl std::fmt::Display) -> StowageError {
    StowageError::copy(format!("{} {}: {}", what, path.display(), e))
}

fn create_dir(path: &Path) -> StowageResult<()> {
    fs::create_dir_all(path).map_err(|e| copy_error("Cannot create", path, e))
}

/// Merge-copy `source` into `destination`
///
/// A directory source contributes its children; a file source is copied
/// into `destination`. Symlinks are skipped. Returns the number of files
/// copied.
pub fn copy_tree(
    source: &Path,
    destination: &Path,
    exclusions: &ExclusionSet,
) -> StowageResult<usize> {
    let metadata = fs::symlink_metadata(source).map_err(|_| {
        StowageError::copy(format!("Source {} does not exist", source.display()))
    })?;

    create_dir(destination)?;

    if metadata.is_file() {
        let Some(name) = source.file_name() else {
            return Ok(0);
        };
        if exclusions.is_excluded(&name.to_string_lossy(), false) {
            return Ok(0);
        }
        let target = destination.join(name);
        fs::copy(source, &target).map_err(|e| copy_error("Cannot copy", source, e))?;
        return Ok(1);
    }

    let mut copied = 0;
    let walker = WalkDir::new(source)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = relative_to_base(source, entry.path());
            !exclusions.is_excluded(&relative, entry.file_type().is_dir())
        });

    for entry in walker {
        let entry = entry.map_err(|e| StowageError::copy(e.to_string()))?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            create_dir(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)
                .map_err(|e| copy_error("Cannot copy", entry.path(), e))?;
            copied += 1;
        } else {
            tracing::debug!(path = %entry.path().display(), "skipping non-regular file");
        }
    }

    Ok(copied)
}

/// Copy a package's sources into its working directory
///
/// Mapped entries go to their own destinations, landing there under their
/// own name; everything else lands under the resolved root. The record comes back with its
/// destination mapping resolved.
pub fn stage_package(global: &GlobalConfig, mut package: PackageConfig) -> StowageResult<PackageConfig> {
    let working_dir = package.working_dir.clone().ok_or_else(|| {
        StowageError::packaging(format!("{} has no working directory", package.package))
    })?;

    let relative = relative_to_base(&global.base_path(), &package.path);
    let plan = plan_copy(&global.destination_mapping, &relative, &package.destination_mapping)?;

    let mut patterns = global.copy_exclusions();
    patterns.extend(package.build_exclusions.iter().cloned());
    let exclusions = ExclusionSet::new(&patterns)?;

    for target in &plan.targets {
        let source = package.path.join(&target.source);
        if source.exists() {
            // A mapped directory keeps its own name below the target, like a file does
            let mut destination = working_dir.join(&target.destination);
            if source.is_dir() {
                if let Some(name) = source.file_name() {
                    destination.push(name);
                }
            }
            let copied = copy_tree(&source, &destination, &exclusions)?;
            tracing::debug!(source = %target.source, destination = %target.destination, copied, "copied mapped directory");
        }
    }

    patterns.extend(plan.root_exclusions());
    let root_exclusions = ExclusionSet::new(&patterns)?;
    let copied = copy_tree(&package.path, &working_dir.join(&plan.root), &root_exclusions)?;
    tracing::debug!(package = %package.package, root = %plan.root, copied, "staged package");

    package.destination_mapping = plan.mapping;
    Ok(package)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::{DestinationMapping, ROOT_KEY};
    use crate::testing::TestHarness;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn none() -> ExclusionSet {
        ExclusionSet::default()
    }

    #[test]
    fn test_copy_merges_into_existing_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "a.txt", "new");
        write(src.path(), "sub/b.txt", "b");
        write(dst.path(), "a.txt", "old");
        write(dst.path(), "keep.txt", "keep");

        let copied = copy_tree(src.path(), dst.path(), &none()).unwrap();

        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dst.path().join("a.txt")).unwrap(), "new");
        assert_eq!(fs::read_to_string(dst.path().join("keep.txt")).unwrap(), "keep");
        assert!(dst.path().join("sub/b.txt").exists());
    }

    #[test]
    fn test_exclusions_omit_matches() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "app.py", "");
        write(src.path(), "app.pyc", "");
        write(src.path(), "pkg/mod.pyc", "");
        write(src.path(), ".git/HEAD", "");

        let exclusions = ExclusionSet::new(["*.pyc", ".git"]).unwrap();
        copy_tree(src.path(), dst.path(), &exclusions).unwrap();

        assert!(dst.path().join("app.py").exists());
        assert!(!dst.path().join("app.pyc").exists());
        assert!(!dst.path().join("pkg/mod.pyc").exists());
        assert!(!dst.path().join(".git").exists());
    }

    #[test]
    fn test_anchored_exclusion_only_matches_at_root() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "conf/a", "");
        write(src.path(), "lib/conf/b", "");

        let exclusions = ExclusionSet::new(["/conf"]).unwrap();
        copy_tree(src.path(), dst.path(), &exclusions).unwrap();

        assert!(!dst.path().join("conf").exists());
        assert!(dst.path().join("lib/conf/b").exists());
    }

    #[test]
    fn test_directory_only_exclusion() {
        let exclusions = ExclusionSet::new(["build/"]).unwrap();
        assert!(exclusions.is_excluded("build", true));
        assert!(!exclusions.is_excluded("build", false));
        assert!(exclusions.is_excluded("nested/build", true));
    }

    #[test]
    fn test_missing_source_is_copy_error() {
        let dst = TempDir::new().unwrap();
        let err = copy_tree(Path::new("/definitely/not/here"), dst.path(), &none()).unwrap_err();
        assert!(matches!(err, StowageError::Copy { .. }));
    }

    #[test]
    fn test_file_source_is_copied_into_destination() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "settings.conf", "x");

        copy_tree(&src.path().join("settings.conf"), &dst.path().join("etc"), &none()).unwrap();
        assert!(dst.path().join("etc/settings.conf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "real", "");
        std::os::unix::fs::symlink(src.path().join("real"), src.path().join("link")).unwrap();

        copy_tree(src.path(), dst.path(), &none()).unwrap();
        assert!(dst.path().join("real").exists());
        assert!(fs::symlink_metadata(dst.path().join("link")).is_err());
    }

    #[test]
    fn test_stage_without_mapping_copies_everything() {
        let base = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = base.path().join("apps/x");
        write(&source, "index.html", "");
        write(&source, "debian.yml", "package: x");

        let mut harness = TestHarness::new();
        harness.global.base_path = Some(base.path().to_path_buf());
        let mut package = harness.package("x", source);
        package.working_dir = Some(work.path().to_path_buf());

        let package = stage_package(&harness.global, package).unwrap();

        assert!(work.path().join("index.html").exists());
        assert!(!work.path().join("debian.yml").exists());
        assert_eq!(package.destination_mapping.get(ROOT_KEY), Some(""));
    }

    #[test]
    fn test_stage_fans_out_mapped_directories() {
        let base = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = base.path().join("apps/x");
        write(&source, "main.py", "");
        write(&source, "static/site.css", "");
        write(&source, "scratch.log", "");

        let mut harness = TestHarness::new();
        harness.global.base_path = Some(base.path().to_path_buf());
        harness.global.destination_mapping =
            DestinationMapping::new().with("apps", "/opt/apps");

        let mut package = harness.package("x", source);
        package.working_dir = Some(work.path().to_path_buf());
        package.destination_mapping = DestinationMapping::new().with("static", "/var/www/x");
        package.build_exclusions = vec!["*.log".into()];

        let package = stage_package(&harness.global, package).unwrap();

        assert!(work.path().join("opt/apps/x/main.py").exists());
        assert!(work.path().join("var/www/x/static/site.css").exists());
        assert!(!work.path().join("var/www/x/site.css").exists());
        assert!(!work.path().join("opt/apps/x/static").exists());
        assert!(!work.path().join("opt/apps/x/scratch.log").exists());
        assert_eq!(package.destination_mapping.root(), "opt/apps/x");
    }

    #[test]
    fn test_stage_mapped_file_and_directory_keep_their_names() {
        let base = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let source = base.path().join("apps/x");
        write(&source, "settings.py", "");
        write(&source, "static/css/site.css", "");
        write(&source, "main.py", "");

        let mut harness = TestHarness::new();
        harness.global.base_path = Some(base.path().to_path_buf());
        let mut package = harness.package("x", source);
        package.working_dir = Some(work.path().to_path_buf());
        package.destination_mapping = DestinationMapping::new()
            .with("settings.py", "/etc/x")
            .with("static", "/var/www/x");

        stage_package(&harness.global, package).unwrap();

        assert!(work.path().join("etc/x/settings.py").exists());
        assert!(work.path().join("var/www/x/static/css/site.css").exists());
        assert!(!work.path().join("var/www/x/css").exists());
        assert!(work.path().join("main.py").exists());
        assert!(!work.path().join("static").exists());
        assert!(!work.path().join("settings.py").exists());
    }

    #[test]
    fn test_uncreatable_destination_is_copy_error() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "a.txt", "a");
        write(dst.path(), "blocker", "not a directory");

        let err = copy_tree(src.path(), &dst.path().join("blocker/sub"), &none()).unwrap_err();

        assert!(matches!(err, StowageError::Copy { .. }));
        assert_eq!(err.exit_code(), 7);
        assert!(err.to_string().contains("Cannot create"));
    }

    #[test]
    fn test_unanchored_path_pattern_matches_trailing_segments() {
        let exclusions = ExclusionSet::new(["lib/conf"]).unwrap();
        assert!(exclusions.is_excluded("lib/conf", true));
        assert!(exclusions.is_excluded("src/lib/conf", true));
        assert!(!exclusions.is_excluded("conf", true));
        assert!(!exclusions.is_excluded("mylib/conf", true));

        let anchored = ExclusionSet::new(["/lib/conf"]).unwrap();
        assert!(anchored.is_excluded("lib/conf", true));
        assert!(!anchored.is_excluded("src/lib/conf", true));
    }

    #[test]
    fn test_stage_requires_working_dir() {
        let harness = TestHarness::new();
        let package = harness.package("x", PathBuf::from("/src/x"));
        let err = stage_package(&harness.global, package).unwrap_err();
        assert!(matches!(err, StowageError::Packaging { .. }));
    }
}
