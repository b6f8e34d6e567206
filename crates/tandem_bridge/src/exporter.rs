//! Symbol export
//!
//! Copies a fixed list of the secondary runtime's globals into a host
//! context's namespace object. Values travel by reference; the namespace
//! and the secondary global end up pointing at the same objects.

use tandem_script::{ScriptContext, ScriptHost, SharedObject};
use tracing::trace;

use crate::error::BridgeError;

/// The exported globals. Fixed at compile time.
pub const EXPORTED_SYMBOLS: [&str; 5] = ["global", "process", "Buffer", "root", "require"];

/// Outcome of one export pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExportReport {
    pub exported: Vec<&'static str>,
    /// Symbols the secondary global did not define. Not an error.
    pub missing: Vec<&'static str>,
}

/// Set `namespace[symbol] = source.global[symbol]` for every exported symbol
/// `source` defines, with `source` entered for the duration.
pub fn export(
    host: &ScriptHost,
    source: &ScriptContext,
    target: &ScriptContext,
    namespace: &SharedObject,
) -> Result<ExportReport, BridgeError> {
    let _entered = host.enter(source);
    let mut report = ExportReport::default();

    for symbol in EXPORTED_SYMBOLS {
        match source.global(symbol)? {
            Some(value) => {
                target.define(namespace, symbol, &value)?;
                report.exported.push(symbol);
            }
            None => {
                trace!(symbol, "secondary global is missing an exported symbol");
                report.missing.push(symbol);
            }
        }
    }
    Ok(report)
}
