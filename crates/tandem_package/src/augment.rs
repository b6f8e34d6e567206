//! Manifest augmentation
//!
//! Marks an application manifest for dual-runtime mode and fills in the
//! keys the host expects: background scripts, permissions, icons.

use std::path::Path;

use serde_json::Value;
use tracing::debug;

use crate::descriptor::ImageSource;
use crate::manifest::Manifest;

pub const MAIN_KEY: &str = "main";
pub const BG_SCRIPT_KEY: &str = "bg-script";
pub const WINDOW_ICON_KEY: &str = "window.icon";

pub const FLAG_KEY: &str = "nwjs-flag";
pub const BACKGROUND_SCRIPTS_KEY: &str = "app.background.scripts";
pub const PERMISSIONS_KEY: &str = "permissions";
pub const ICONS_KEY: &str = "icons";

/// Always the first background script.
pub const BOOTSTRAP_SCRIPT: &str = "tandem/default.js";

/// Replaces any permissions the manifest declared.
pub const PERMISSIONS: [&str; 2] = ["developerPrivate", "management"];

/// What [`augment`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Augmentation {
    pub dual_runtime: bool,
    pub icon_width: Option<u32>,
}

/// Augment `manifest` in place.
///
/// A string `main` turns on the mode flag and overwrites the background
/// script and permission lists. A `window.icon` that resolves through
/// `images` adds `icons.<width>`. The two are independent; keys other than
/// these are left untouched.
pub fn augment(manifest: &mut Manifest, images: &dyn ImageSource) -> Augmentation {
    let mut outcome = Augmentation::default();

    if manifest.get_str(MAIN_KEY).is_some() {
        let mut scripts = vec![Value::from(BOOTSTRAP_SCRIPT)];
        if let Some(bg_script) = manifest.get_str(BG_SCRIPT_KEY) {
            scripts.push(Value::from(bg_script));
        }
        manifest.set(FLAG_KEY, true);
        manifest.set(BACKGROUND_SCRIPTS_KEY, scripts);
        manifest.set(PERMISSIONS_KEY, PERMISSIONS.to_vec());
        outcome.dual_runtime = true;
    }

    if let Some(icon) = manifest.get_str(WINDOW_ICON_KEY).map(str::to_owned) {
        match images.lookup_image(Path::new(&icon)) {
            Some(info) => {
                manifest.set(&format!("{ICONS_KEY}.{}", info.width), icon);
                outcome.icon_width = Some(info.width);
            }
            None => debug!(%icon, "window icon did not resolve; no icon entry added"),
        }
    }

    outcome
}
