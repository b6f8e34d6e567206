//! Tandem Packaged Applications
//!
//! The application side of the bridge: where the packaged app lives on
//! disk, its manifest, and the process hooks that run around startup and
//! shutdown.
//!
//! - [`PackageDescriptor`]: app root and image lookup
//! - [`PackageSlot`]: the process's single descriptor, created lazily and
//!   released once at teardown
//! - [`augment`]: marks a manifest for dual-runtime mode
//! - [`hooks`]: startup and teardown entry points

pub mod augment;
pub mod command_line;
pub mod descriptor;
pub mod error;
pub mod hooks;
pub mod manifest;
pub mod slot;

pub use augment::{augment, Augmentation};
pub use command_line::CommandLine;
pub use descriptor::{ImageInfo, ImageSource, PackageDescriptor, MANIFEST_FILE};
pub use error::PackageError;
pub use hooks::{load_app_manifest, post_destroy_threads, pre_create_threads, ResultCode};
pub use manifest::Manifest;
pub use slot::PackageSlot;
