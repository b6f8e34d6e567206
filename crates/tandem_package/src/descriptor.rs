//! Packaged application descriptor

use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::PackageError;
use crate::manifest::Manifest;

/// File marking a directory as a packaged application.
pub const MANIFEST_FILE: &str = "package.json";

/// Pixel dimensions of an image inside a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Resolves package-relative image paths.
pub trait ImageSource {
    /// `None` when the image is missing or cannot be decoded.
    fn lookup_image(&self, relative: &Path) -> Option<ImageInfo>;
}

/// Where a packaged application lives. The root may be empty when no
/// package was found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageDescriptor {
    root: PathBuf,
}

impl PackageDescriptor {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the package from the process arguments (without the program
    /// name). The first positional argument naming a directory with a
    /// manifest wins, then `cwd` itself; otherwise the root is empty.
    pub fn discover<I, S>(args: I, cwd: &Path) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            let arg = arg.as_ref();
            if arg.to_string_lossy().starts_with('-') {
                continue;
            }
            let candidate = cwd.join(arg);
            if candidate.join(MANIFEST_FILE).is_file() {
                debug!(root = %candidate.display(), "package found from arguments");
                return Self::new(candidate);
            }
        }
        if cwd.join(MANIFEST_FILE).is_file() {
            debug!(root = %cwd.display(), "package found in working directory");
            return Self::new(cwd);
        }
        Self::default()
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_os_str().is_empty()
    }

    /// The root with separators normalized for the platform.
    pub fn normalized_path(&self) -> PathBuf {
        self.root.components().collect()
    }

    /// Read and parse the package manifest.
    pub fn manifest(&self) -> Result<Manifest, PackageError> {
        if self.is_empty() {
            return Err(PackageError::NoPackage);
        }
        let path = self.root.join(MANIFEST_FILE);
        let text = std::fs::read_to_string(&path).map_err(|source| PackageError::Io {
            path: path.clone(),
            source,
        })?;
        Manifest::from_json(&text)
    }
}

impl ImageSource for PackageDescriptor {
    fn lookup_image(&self, relative: &Path) -> Option<ImageInfo> {
        if self.is_empty() {
            return None;
        }
        let escapes = relative
            .components()
            .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));
        if escapes {
            debug!(path = %relative.display(), "refusing image path outside the package");
            return None;
        }

        match image::image_dimensions(self.root.join(relative)) {
            Ok((width, height)) => Some(ImageInfo { width, height }),
            Err(err) => {
                debug!(path = %relative.display(), error = %err, "image lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(MANIFEST_FILE), r#"{ "main": "index.js" }"#).unwrap();
        dir
    }

    #[test]
    fn discover_prefers_positional_arguments() {
        let cwd = tempfile::tempdir().unwrap();
        let app = cwd.path().join("app");
        std::fs::create_dir(&app).unwrap();
        std::fs::write(app.join(MANIFEST_FILE), "{}").unwrap();

        let found = PackageDescriptor::discover(["--verbose", "missing", "app"], cwd.path());
        assert_eq!(found.path(), app.as_path());
    }

    #[test]
    fn discover_falls_back_to_cwd_then_empty() {
        let app = package_dir();
        let found = PackageDescriptor::discover(Vec::<String>::new(), app.path());
        assert_eq!(found.path(), app.path());

        let empty = tempfile::tempdir().unwrap();
        let none = PackageDescriptor::discover(["nothing-here"], empty.path());
        assert!(none.is_empty());
        assert!(matches!(none.manifest(), Err(PackageError::NoPackage)));
    }

    #[test]
    fn manifest_is_read_from_the_root() {
        let app = package_dir();
        let manifest = PackageDescriptor::new(app.path()).manifest().unwrap();
        assert_eq!(manifest.get_str("main"), Some("index.js"));
    }

    #[test]
    fn images_report_their_dimensions() {
        let app = package_dir();
        image::RgbaImage::new(32, 16)
            .save(app.path().join("icon.png"))
            .unwrap();
        let package = PackageDescriptor::new(app.path());

        assert_eq!(
            package.lookup_image(Path::new("icon.png")),
            Some(ImageInfo { width: 32, height: 16 })
        );
        assert_eq!(package.lookup_image(Path::new("missing.png")), None);
        assert_eq!(package.lookup_image(Path::new("../icon.png")), None);
    }

    #[test]
    fn undecodable_images_are_absent() {
        let app = package_dir();
        std::fs::write(app.path().join("broken.png"), b"not a png").unwrap();
        let package = PackageDescriptor::new(app.path());
        assert_eq!(package.lookup_image(Path::new("broken.png")), None);
    }
}
