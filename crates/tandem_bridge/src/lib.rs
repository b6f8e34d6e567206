//! Tandem Context Bridge
//!
//! Embeds a secondary JavaScript runtime (CommonJS modules, `Buffer`,
//! `process`) next to the host's own contexts and exposes a fixed set of
//! its globals inside every host context through a namespace object.
//!
//! ## Flow
//!
//! 1. The host creates a context and calls [`ContextBridge::on_context_created`].
//! 2. The first call bootstraps the secondary runtime ([`Bootstrapper`]):
//!    start the instance, align its security token, stamp `process.versions`.
//! 3. Every call links the context to the runtime's [`Environment`], copies
//!    the security token over, and exports the fixed symbols into the
//!    namespace object by reference.
//!
//! Exported objects are shared, not copied: a mutation made through one host
//! context is seen by the secondary runtime and every other bridged context.

pub mod bootstrap;
pub mod bridge;
pub mod environment;
pub mod error;
pub mod exporter;
pub mod settings;
pub mod versions;

pub use bootstrap::{BootstrapState, Bootstrapper};
pub use bridge::ContextBridge;
pub use environment::{Environment, RuntimeInstance, TickCallback};
pub use error::BridgeError;
pub use exporter::{ExportReport, EXPORTED_SYMBOLS};
pub use settings::BridgeSettings;

/// Embedder-data slot holding the [`Environment`] on every bridged context.
///
/// The secondary runtime looks its environment up through the same index;
/// both sides must agree on it.
pub const ENVIRONMENT_SLOT: usize = 32;

/// Embedder-data slot carrying [`CONTEXT_MARKER`] on the secondary context.
pub const MARKER_SLOT: usize = 0;

/// Marker identifying the secondary runtime's own context.
pub const CONTEXT_MARKER: &str = "tandem";
