// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stowage contributors

//! Debian backend
//!
//! Builds `.deb` archives with `dpkg -b`. Ownership and permission fixes
//! run under fakeroot so the archive records `root:root` without needing
//! real privileges.

use async_trait::async_trait;
use colored::Colorize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::{render, PackageBackend, PackageFormat};
use crate::config::{GlobalConfig, PackageConfig};
use crate::errors::{StowageError, StowageResult};
use crate::executors::CommandRequest;
use crate::hooks::HookPhase;
use crate::pipeline::BuildContext;
use crate::staging::stage_package;
use crate::utils::{create_spinner, display_warning, merge_unique, strip_leading_slash};

/// Longest synopsis dpkg tools display without truncation
pub const MAX_DESCRIPTION_LENGTH: usize = 60;

const CONTROL_TEMPLATE: &str = "\
Package: {{package}}
Version: {{version}}
Architecture: {{architecture}}
Maintainer: {{maintainer}}
Depends: {{depends}}
Description: {{description}}
";

const DEPENDS_LINE: &str = "Depends: {{depends}}\n";

const COPYRIGHT_TEMPLATE: &str = "\
Package: {{package}}
Maintainer: {{maintainer}}

This package was assembled from {{package}} sources. See the upstream
project for its copyright and license terms.
";

/// `.deb` archives via dpkg
#[derive(Debug, Default)]
pub struct DebianBackend;

impl DebianBackend {
    pub fn new() -> Self {
        Self
    }

    fn load_template(path: Option<&Path>, builtin: &str, what: &str) -> StowageResult<String> {
        match path {
            None => Ok(builtin.to_string()),
            Some(path) => fs::read_to_string(path).map_err(|e| StowageError::Packaging {
                message: format!("Missing {} template file: {} ({})", what, path.display(), e),
                help: None,
            }),
        }
    }

    /// Fill in the fields the control file needs and compute its values
    ///
    /// The maintainer falls back to the global one, the description to
    /// `<package> package`; depends loses duplicates and the package itself.
    pub fn control_values(
        global: &GlobalConfig,
        package: &mut PackageConfig,
    ) -> BTreeMap<String, String> {
        if package.maintainer.is_none() {
            package.maintainer = global.maintainer.clone();
        }
        if package.description.is_none() {
            package.description = Some(format!("{} package", package.package));
        }
        package.depends = merge_unique(&package.depends, &[])
            .into_iter()
            .filter(|d| d != &package.package)
            .collect();

        let mut values: BTreeMap<String, String> = package
            .extra
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
            .collect();

        values.insert("package".into(), package.package.clone());
        values.insert("version".into(), package.version.clone());
        values.insert("architecture".into(), package.architecture.clone());
        values.insert("depends".into(), package.depends.join(", "));
        if let Some(ref maintainer) = package.maintainer {
            values.insert("maintainer".into(), maintainer.clone());
        }
        if let Some(ref description) = package.description {
            values.insert("description".into(), description.clone());
        }
        values
    }

    /// Render `DEBIAN/control`
    pub fn render_control(template: &str, values: &BTreeMap<String, String>) -> StowageResult<String> {
        let empty_depends = values.get("depends").map_or(true, |d| d.is_empty());
        if empty_depends {
            render(&template.replace(DEPENDS_LINE, ""), values)
        } else {
            render(template, values)
        }
    }

    /// Absolute in-package paths of every configuration file
    ///
    /// Directory entries are walked, pruning path exclusions by basename.
    pub fn collect_conffiles(
        working_dir: &Path,
        entries: &[String],
        exclusions: &[String],
    ) -> Vec<String> {
        let mut found = BTreeSet::new();

        for entry in entries {
            let item = working_dir.join(strip_leading_slash(entry));
            if item.is_dir() {
                let walker = WalkDir::new(&item)
                    .sort_by_file_name()
                    .into_iter()
                    .filter_entry(|e| {
                        !(e.file_type().is_dir()
                            && exclusions
                                .iter()
                                .any(|x| e.file_name().to_string_lossy() == x.as_str()))
                    });
                for file in walker.filter_map(Result::ok).filter(|e| e.file_type().is_file()) {
                    found.insert(file.path().to_path_buf());
                }
            } else if item.is_file() {
                found.insert(item);
            }
        }

        found
            .iter()
            .filter_map(|p| p.strip_prefix(working_dir).ok())
            .map(|p| format!("/{}", p.to_string_lossy()))
            .collect()
    }

    fn working_dir(package: &PackageConfig) -> StowageResult<PathBuf> {
        package.working_dir.clone().ok_or_else(|| {
            StowageError::packaging(format!("{} has no working directory", package.package))
        })
    }

    fn write(path: &Path, content: &str) -> StowageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                StowageError::packaging(format!("Cannot create {}: {}", parent.display(), e))
            })?;
        }
        fs::write(path, content)
            .map_err(|e| StowageError::packaging(format!("Cannot write {}: {}", path.display(), e)))
    }

    async fn run_archiver(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
        working_dir: &Path,
    ) -> StowageResult<PackageConfig> {
        let dir = working_dir.to_string_lossy().into_owned();

        ctx.privileged(&CommandRequest::new("chown", ["-R", "root:root", dir.as_str()]))
            .await?;
        ctx.privileged(&CommandRequest::new("chmod", ["-R", "a-s", dir.as_str()]))
            .await?;

        let package = ctx.run_hooks(HookPhase::PostPermissions, package).await?;

        if !ctx.global.quiet {
            println!("  Building package {}", package.package.bold());
            println!("  From {}", package.path.display());
        }

        let temp = ctx.global.temp_dir();
        fs::create_dir_all(&temp)?;
        let artifact = temp.join(&package.package_filename);
        let artifact = artifact.to_string_lossy();

        let spinner = create_spinner(&format!("dpkg -b {}", package.package), ctx.global.quiet);
        let result = ctx
            .privileged(&CommandRequest::new("dpkg", ["-b", dir.as_str(), artifact.as_ref()]))
            .await;
        spinner.finish_and_clear();
        result?;

        Ok(package)
    }
}

#[async_trait]
impl PackageBackend for DebianBackend {
    fn format(&self) -> PackageFormat {
        PackageFormat::Deb
    }

    fn required_tools(&self) -> &'static [&'static str] {
        &["dpkg", "fakeroot"]
    }

    fn make_package_filename(&self, package: &PackageConfig) -> String {
        format!(
            "{}_{}_{}.deb",
            package.package, package.version, package.architecture
        )
    }

    fn pre_build(&self, global: &GlobalConfig, package: &PackageConfig) -> StowageResult<()> {
        if !self.is_valid_package_name(&package.package) {
            return Err(StowageError::Packaging {
                message: format!("'{}' is not a valid package name", package.package),
                help: Some(
                    "Debian names use lowercase letters, digits, '-' and '+' only".into(),
                ),
            });
        }

        if let Some(ref description) = package.description {
            if description.chars().count() >= MAX_DESCRIPTION_LENGTH {
                display_warning(
                    global.quiet,
                    &format!(
                        "Warning: description of {} is {} characters; keep it under {}",
                        package.package,
                        description.chars().count(),
                        MAX_DESCRIPTION_LENGTH
                    ),
                );
            }
        }
        Ok(())
    }

    async fn copy_files_to_package_dir(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        stage_package(ctx.global, package)
    }

    async fn make_package_conf_files(
        &self,
        ctx: &BuildContext<'_>,
        mut package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let working_dir = Self::working_dir(&package)?;
        let global = ctx.global;

        let template = Self::load_template(
            global.control_template.as_deref(),
            CONTROL_TEMPLATE,
            "control",
        )?;
        let values = Self::control_values(global, &mut package);
        let control = Self::render_control(&template, &values)?;
        Self::write(&working_dir.join("DEBIAN/control"), &control)?;

        if !package.conffiles.is_empty() {
            let exclusions: Vec<String> = global
                .default_path_exclusions
                .iter()
                .chain(package.path_exclusions.iter())
                .cloned()
                .collect();
            let conffiles = Self::collect_conffiles(&working_dir, &package.conffiles, &exclusions);
            let mut listing = conffiles.join("\n");
            listing.push('\n');
            Self::write(&working_dir.join("DEBIAN/conffiles"), &listing)?;
        }

        let copyright = Self::load_template(
            global.copyright_template.as_deref(),
            COPYRIGHT_TEMPLATE,
            "copyright",
        )?;
        let copyright = render(&copyright, &values)?;
        let doc_dir = working_dir.join("usr/share/doc").join(&package.package);
        Self::write(&doc_dir.join("copyright"), &copyright)?;

        Ok(package)
    }

    async fn build_package(
        &self,
        ctx: &BuildContext<'_>,
        package: PackageConfig,
    ) -> StowageResult<PackageConfig> {
        let working_dir = Self::working_dir(&package)?;

        let result = self.run_archiver(ctx, package, &working_dir).await;
        ctx.fakeroot.release();
        let package = result?;

        if !ctx.global.no_clean {
            fs::remove_dir_all(&working_dir)?;
        }
        Ok(package)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookRegistry;
    use crate::testing::TestHarness;
    use tempfile::TempDir;

    fn package(harness: &TestHarness, work: &Path) -> PackageConfig {
        let mut package = harness.package("web-app", PathBuf::from("/src/web/app"));
        package.version = "0.42".into();
        package.working_dir = Some(work.to_path_buf());
        package
    }

    #[test]
    fn test_package_filename() {
        let harness = TestHarness::new();
        let mut package = harness.package("web-app", PathBuf::from("/src/web/app"));
        package.version = "0.1234".into();
        package.architecture = "amd64".into();
        assert_eq!(
            DebianBackend::new().make_package_filename(&package),
            "web-app_0.1234_amd64.deb"
        );
    }

    #[test]
    fn test_pre_build_rejects_invalid_names() {
        let harness = TestHarness::new();
        let package = harness.package("Web_App", PathBuf::from("/src"));
        let err = DebianBackend::new()
            .pre_build(&harness.global, &package)
            .unwrap_err();
        assert!(matches!(err, StowageError::Packaging { .. }));
    }

    #[test]
    fn test_control_file() {
        let mut harness = TestHarness::new();
        harness.global.maintainer = Some("Ops <ops@example.com>".into());
        let mut package = harness.package("web-app", PathBuf::from("/src/web/app"));
        package.version = "0.42".into();
        package.depends = vec!["libc6".into(), "python".into(), "web-app".into(), "libc6".into()];

        let values = DebianBackend::control_values(&harness.global, &mut package);
        let control = DebianBackend::render_control(CONTROL_TEMPLATE, &values).unwrap();

        insta::assert_snapshot!(control, @r###"
        Package: web-app
        Version: 0.42
        Architecture: all
        Maintainer: Ops <ops@example.com>
        Depends: libc6, python
        Description: web-app package
        "###);
    }

    #[test]
    fn test_control_file_without_depends() {
        let mut harness = TestHarness::new();
        harness.global.maintainer = Some("Ops".into());
        let mut package = harness.package("web-app", PathBuf::from("/src"));

        let values = DebianBackend::control_values(&harness.global, &mut package);
        let control = DebianBackend::render_control(CONTROL_TEMPLATE, &values).unwrap();
        assert!(!control.contains("Depends"));
    }

    #[test]
    fn test_control_needs_a_maintainer() {
        let harness = TestHarness::new();
        let mut package = harness.package("web-app", PathBuf::from("/src"));

        let values = DebianBackend::control_values(&harness.global, &mut package);
        let err = DebianBackend::render_control(CONTROL_TEMPLATE, &values).unwrap_err();
        assert!(err.to_string().contains("maintainer missing from config"));
    }

    #[test]
    fn test_conffiles_listing() {
        let work = TempDir::new().unwrap();
        for file in ["etc/app/a.conf", "etc/app/sub/b.conf", "etc/app/.svn/entries", "etc/solo"] {
            let path = work.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let listing = DebianBackend::collect_conffiles(
            work.path(),
            &["etc/app".into(), "/etc/solo".into(), "etc/missing".into()],
            &[".svn".into()],
        );
        assert_eq!(
            listing,
            vec!["/etc/app/a.conf", "/etc/app/sub/b.conf", "/etc/solo"]
        );
    }

    #[tokio::test]
    async fn test_conf_files_written() {
        let work = TempDir::new().unwrap();
        fs::create_dir_all(work.path().join("etc")).unwrap();
        fs::write(work.path().join("etc/app.conf"), "").unwrap();

        let mut harness = TestHarness::new();
        harness.global.maintainer = Some("Ops".into());
        let registry = HookRegistry::new();
        let ctx = harness.context(&registry);

        let mut pkg = package(&harness, work.path());
        pkg.conffiles = vec!["etc".into()];
        let pkg = DebianBackend::new()
            .make_package_conf_files(&ctx, pkg)
            .await
            .unwrap();

        assert_eq!(pkg.maintainer.as_deref(), Some("Ops"));
        let conffiles = fs::read_to_string(work.path().join("DEBIAN/conffiles")).unwrap();
        assert_eq!(conffiles, "/etc/app.conf\n");
        assert!(work.path().join("usr/share/doc/web-app/copyright").exists());
        assert!(work.path().join("DEBIAN/control").exists());
    }

    #[tokio::test]
    async fn test_build_runs_dpkg_under_fakeroot_and_cleans() {
        let build = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let staged = work.path().join("web-app");
        fs::create_dir_all(&staged).unwrap();

        let mut harness = TestHarness::new();
        harness.global.build_directory = build.path().to_path_buf();
        let registry = HookRegistry::new();
        let ctx = harness.context(&registry);

        let pkg = package(&harness, &staged);
        DebianBackend::new().build_package(&ctx, pkg).await.unwrap();

        let commands: Vec<Vec<String>> = harness
            .runner
            .commands()
            .into_iter()
            .map(|c| c.args[5..].to_vec())
            .collect();
        assert_eq!(commands[0][0], "chown");
        assert_eq!(commands[1][0], "chmod");
        assert_eq!(commands[2][0], "dpkg");
        assert!(build.path().join("temp/web-app_0.42_all.deb").exists());
        assert!(!staged.exists());
        assert!(!harness.fakeroot.is_active());
    }

    #[tokio::test]
    async fn test_failed_build_releases_fakeroot() {
        let build = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();

        let mut harness = TestHarness::new();
        harness.global.build_directory = build.path().to_path_buf();
        harness.runner.fail("dpkg");
        let registry = HookRegistry::new();
        let ctx = harness.context(&registry);

        let pkg = package(&harness, work.path());
        let err = DebianBackend::new().build_package(&ctx, pkg).await.unwrap_err();

        assert!(matches!(err, StowageError::Command { .. }));
        assert!(!harness.fakeroot.is_active());
        assert!(work.path().exists());
    }
}
