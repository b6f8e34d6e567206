//! Version stamping
//!
//! Writes the build's identifiers into the secondary runtime's
//! `process.versions` record. Runs once per process, during bootstrap.

use tandem_script::ScriptContext;

use crate::error::BridgeError;

pub const PRODUCT_KEY: &str = "tandem";
pub const ALIAS_KEY: &str = "tandem-bridge";
pub const COMMIT_KEY: &str = "tandem-commit-id";
pub const ENGINE_KEY: &str = "quickjs";

/// Tandem release.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Source commit the build was made from, if the build exported one.
pub const COMMIT_HASH: &str = commit_or_unknown(option_env!("TANDEM_COMMIT_HASH"));

const fn commit_or_unknown(hash: Option<&'static str>) -> &'static str {
    match hash {
        Some(hash) if !hash.is_empty() => hash,
        _ => "unknown",
    }
}

/// Release of the QuickJS engine bundled with the host.
pub const ENGINE_VERSION: &str = "2024-01-13";

/// The four stamped entries, in stamping order.
pub fn entries() -> [(&'static str, &'static str); 4] {
    [
        (PRODUCT_KEY, VERSION),
        (ALIAS_KEY, VERSION),
        (COMMIT_KEY, COMMIT_HASH),
        (ENGINE_KEY, ENGINE_VERSION),
    ]
}

/// One assignment statement per entry.
pub fn stamp_script() -> String {
    entries()
        .iter()
        .map(|(key, value)| {
            format!(
                "process.versions[{}] = {};",
                serde_json::Value::from(*key),
                serde_json::Value::from(*value)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Stamp `process.versions` inside the secondary runtime's context.
///
/// Stamping again overwrites the keys with identical values.
pub fn stamp(secondary: &ScriptContext) -> Result<(), BridgeError> {
    secondary.eval::<()>(&stamp_script())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tandem_script::ScriptHost;

    #[test]
    fn script_assigns_every_key() {
        let script = stamp_script();
        assert_eq!(script.lines().count(), 4);
        for (key, _) in entries() {
            assert!(script.contains(&format!("process.versions[\"{key}\"]")));
        }
    }

    #[test]
    fn stamping_is_idempotent() {
        let host = ScriptHost::new().unwrap();
        let ctx = host.create_context("secondary").unwrap();
        ctx.eval::<()>("globalThis.process = { versions: {} };").unwrap();

        stamp(&ctx).unwrap();
        let first = ctx.eval::<String>("JSON.stringify(process.versions)").unwrap();
        stamp(&ctx).unwrap();
        let second = ctx.eval::<String>("JSON.stringify(process.versions)").unwrap();

        assert_eq!(first, second);
        assert_eq!(ctx.eval::<u32>("Object.keys(process.versions).length").unwrap(), 4);
        assert_eq!(ctx.eval::<String>("process.versions.tandem").unwrap(), VERSION);
    }

    #[test]
    fn blank_commit_hash_reads_as_unknown() {
        assert_eq!(commit_or_unknown(None), "unknown");
        assert_eq!(commit_or_unknown(Some("")), "unknown");
        assert_eq!(commit_or_unknown(Some("3f2a9c1")), "3f2a9c1");
    }

    #[test]
    fn every_value_is_non_empty() {
        for (_, value) in entries() {
            assert!(!value.is_empty());
        }
    }
}
