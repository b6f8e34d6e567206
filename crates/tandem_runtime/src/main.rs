//! Tandem Runtime
//!
//! Binary that loads a packaged application, bridges its main context to
//! the secondary runtime and runs the app's `main` script through it.

use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context as _, Result};
use tandem_bridge::{BridgeSettings, ContextBridge};
use tandem_package::augment::MAIN_KEY;
use tandem_package::{
    load_app_manifest, post_destroy_threads, pre_create_threads, CommandLine, PackageSlot,
    ResultCode,
};
use tandem_script::{ScriptContext, ScriptHost};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Registry};

/// Optional bridge settings file in the package root.
const SETTINGS_FILE: &str = "tandem.json";

/// Upper bound on tick/microtask rounds before the app is considered stuck.
const MAX_SETTLE_ROUNDS: usize = 10_000;

fn main() -> Result<()> {
    let log_filter = init_logging();

    let mut slot = PackageSlot::from_process();
    let settings = load_settings(&mut slot)?;
    if let Some(handle) = log_filter {
        handle
            .reload(EnvFilter::new(&settings.log_filter))
            .context("applying the settings log filter")?;
    }

    tracing::info!("Tandem v{}", env!("CARGO_PKG_VERSION"));

    let mut command_line = CommandLine::parse(std::env::args_os());
    let code = pre_create_threads(&mut command_line, &mut slot);
    if code != ResultCode::NormalExit {
        std::process::exit(code.code());
    }
    tracing::debug!(argv = ?command_line.argv(), "command line prepared");

    let result = run(&mut slot, settings);
    post_destroy_threads(&mut slot);
    result
}

/// Install the fmt subscriber. `RUST_LOG` wins when set; otherwise the
/// returned handle swaps in the settings filter once settings are loaded.
fn init_logging() -> Option<reload::Handle<EnvFilter, Registry>> {
    let from_env = EnvFilter::try_from_default_env().ok();
    let pinned = from_env.is_some();
    let (filter, handle) =
        reload::Layer::new(from_env.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
    (!pinned).then_some(handle)
}

fn load_settings(slot: &mut PackageSlot) -> Result<BridgeSettings> {
    let package = slot.get_or_create()?;
    if package.is_empty() {
        return Ok(BridgeSettings::default());
    }
    let path = package.path().join(SETTINGS_FILE);
    if !path.is_file() {
        return Ok(BridgeSettings::default());
    }
    BridgeSettings::load(&path).with_context(|| format!("loading {}", path.display()))
}

fn run(slot: &mut PackageSlot, settings: BridgeSettings) -> Result<()> {
    let (manifest, _) = load_app_manifest(slot).context("loading application manifest")?;
    let Some(main_script) = manifest.get_str(MAIN_KEY) else {
        bail!("package manifest has no string `{MAIN_KEY}` entry");
    };
    tracing::info!(
        manifest = %serde_json::Value::Object(manifest.as_map().clone()),
        "augmented manifest"
    );

    let package = slot.get_or_create()?;
    let entry = package.normalized_path().join(main_script);
    let namespace = settings.namespace.clone();

    let host = Rc::new(ScriptHost::new()?);
    let mut bridge = ContextBridge::new(Rc::clone(&host), settings);

    let main_context = host.create_context("main")?;
    bridge
        .on_context_created(&main_context)
        .context("bridging the main context")?;

    {
        let _entered = host.enter(&main_context);
        tracing::info!(entry = %entry.display(), "running application entry point");
        main_context.eval::<()>(&require_script(&namespace, &entry)?)?;
    }

    settle(&host, &bridge, &main_context)?;
    report(&bridge);
    Ok(())
}

fn require_script(namespace: &str, entry: &Path) -> Result<String> {
    let namespace = serde_json::to_string(namespace)?;
    let entry = serde_json::to_string(&entry.to_string_lossy())?;
    Ok(format!("globalThis[{namespace}].require({entry});"))
}

/// Alternate ticks and microtask checkpoints until both queues are empty.
fn settle(host: &ScriptHost, bridge: &ContextBridge, context: &ScriptContext) -> Result<()> {
    for _ in 0..MAX_SETTLE_ROUNDS {
        let ticks = bridge.tick_context(context)?;
        let jobs = host.perform_microtask_checkpoint()?;
        if ticks == 0 && jobs == 0 {
            return Ok(());
        }
    }
    bail!("application did not settle after {MAX_SETTLE_ROUNDS} rounds")
}

fn report(bridge: &ContextBridge) {
    for (name, value) in bridge.counters().snapshot() {
        tracing::info!(counter = name, value, "bridge counter");
    }
    for phase in ["bootstrap", "bridge"] {
        let stats = bridge.phases().stats(phase);
        tracing::info!(phase, runs = stats.runs, total = ?stats.total, "bridge phase");
    }
}
