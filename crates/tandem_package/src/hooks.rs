//! Startup and teardown entry points
//!
//! [`pre_create_threads`] and [`load_app_manifest`] are the two places the
//! package descriptor may first be created; [`post_destroy_threads`] is the
//! single place it is released.

use tracing::{debug, info, warn};

use crate::augment::{augment, Augmentation};
use crate::command_line::CommandLine;
use crate::error::PackageError;
use crate::manifest::Manifest;
use crate::slot::PackageSlot;

pub const NO_SANDBOX_SWITCH: &str = "no-sandbox";

/// Status returned by the startup hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// Startup continues normally.
    NormalExit,
}

impl ResultCode {
    pub fn code(self) -> i32 {
        match self {
            ResultCode::NormalExit => 0,
        }
    }
}

/// Runs before the host starts its threads.
///
/// Always disables the sandbox. When a package was found its normalized
/// root is appended as a positional argument.
pub fn pre_create_threads(command_line: &mut CommandLine, slot: &mut PackageSlot) -> ResultCode {
    command_line.append_switch(NO_SANDBOX_SWITCH);

    match slot.get_or_create() {
        Ok(package) if !package.is_empty() => {
            let root = package.normalized_path();
            debug!(root = %root.display(), "appending package root");
            command_line.append_arg_path(&root);
        }
        Ok(_) => debug!("no package found; command line left without a root"),
        Err(err) => warn!(error = %err, "package unavailable during startup"),
    }

    ResultCode::NormalExit
}

/// Runs after the host has stopped its threads. Releases the package
/// descriptor; later accesses fail.
pub fn post_destroy_threads(slot: &mut PackageSlot) {
    if slot.release().is_none() {
        debug!("no package descriptor to release");
    }
}

/// Read the package manifest and augment it for dual-runtime mode.
pub fn load_app_manifest(slot: &mut PackageSlot) -> Result<(Manifest, Augmentation), PackageError> {
    let package = slot.get_or_create()?;
    let mut manifest = package.manifest()?;
    let outcome = augment(&mut manifest, package);
    info!(
        root = %package.path().display(),
        dual_runtime = outcome.dual_runtime,
        icon_width = ?outcome.icon_width,
        "application manifest loaded"
    );
    Ok((manifest, outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::augment::{BACKGROUND_SCRIPTS_KEY, BOOTSTRAP_SCRIPT, FLAG_KEY};
    use crate::descriptor::{PackageDescriptor, MANIFEST_FILE};
    use std::path::PathBuf;

    fn slot_at(root: impl Into<PathBuf>) -> PackageSlot {
        let root = root.into();
        PackageSlot::new(move || PackageDescriptor::new(root.clone()))
    }

    #[test]
    fn startup_disables_the_sandbox_and_appends_the_root() {
        let mut line = CommandLine::new("tandem");
        let mut slot = slot_at("/srv/./app");

        assert_eq!(pre_create_threads(&mut line, &mut slot), ResultCode::NormalExit);
        assert!(line.has_switch(NO_SANDBOX_SWITCH));
        assert_eq!(line.args(), ["/srv/app"]);
        assert_eq!(slot.creations(), 1);
    }

    #[test]
    fn startup_without_a_package_only_adds_the_switch() {
        let mut line = CommandLine::new("tandem");
        let mut slot = slot_at("");

        assert_eq!(pre_create_threads(&mut line, &mut slot), ResultCode::NormalExit);
        assert_eq!(line.argv(), ["tandem", "--no-sandbox"]);
    }

    #[test]
    fn startup_after_teardown_still_succeeds() {
        let mut line = CommandLine::new("tandem");
        let mut slot = slot_at("/srv/app");
        post_destroy_threads(&mut slot);

        assert_eq!(pre_create_threads(&mut line, &mut slot), ResultCode::NormalExit);
        assert!(line.args().is_empty());
        assert_eq!(slot.creations(), 0);
    }

    #[test]
    fn both_creation_sites_share_one_descriptor() {
        let app = tempfile::tempdir().unwrap();
        std::fs::write(
            app.path().join(MANIFEST_FILE),
            r#"{ "main": "index.js", "bg-script": "bg.js" }"#,
        )
        .unwrap();
        let mut slot = slot_at(app.path());

        let (manifest, outcome) = load_app_manifest(&mut slot).unwrap();
        pre_create_threads(&mut CommandLine::new("tandem"), &mut slot);

        assert!(outcome.dual_runtime);
        assert_eq!(manifest.get(FLAG_KEY), Some(&serde_json::json!(true)));
        assert_eq!(
            manifest.get(BACKGROUND_SCRIPTS_KEY),
            Some(&serde_json::json!([BOOTSTRAP_SCRIPT, "bg.js"]))
        );
        assert_eq!(slot.creations(), 1);

        post_destroy_threads(&mut slot);
        assert!(matches!(load_app_manifest(&mut slot), Err(PackageError::Released)));
    }
}
