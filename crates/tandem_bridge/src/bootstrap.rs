//! One-time bootstrap of the secondary runtime
//!
//! The first [`Bootstrapper::ensure`] call starts the runtime; every later
//! call returns the same [`Environment`]. A failed start is final.

use std::rc::Rc;

use tandem_script::{ScriptHost, SecurityToken};
use tracing::{error, info};

use crate::environment::{Environment, RuntimeInstance};
use crate::error::BridgeError;
use crate::{versions, CONTEXT_MARKER, ENVIRONMENT_SLOT, MARKER_SLOT};

/// Name given to the secondary runtime's context.
pub const SECONDARY_CONTEXT_NAME: &str = "tandem:secondary";

#[derive(Debug, Default)]
pub enum BootstrapState {
    #[default]
    Uninitialized,
    /// A start is underway, or a previous one unwound without finishing.
    Initializing,
    Ready(Rc<Environment>),
    Failed(String),
}

/// Drives [`BootstrapState`].
///
/// Holds `Rc`s, so it is confined to the thread that created it; the host's
/// context-creation sequence is the only caller.
#[derive(Debug)]
pub struct Bootstrapper {
    state: BootstrapState,
    argv: Vec<String>,
    preload: Option<String>,
    starts: u32,
}

impl Bootstrapper {
    pub fn new(argv: Vec<String>) -> Self {
        Self {
            state: BootstrapState::Uninitialized,
            argv,
            preload: None,
            starts: 0,
        }
    }

    pub fn with_preload(mut self, preload: Option<String>) -> Self {
        self.preload = preload;
        self
    }

    pub fn state(&self) -> &BootstrapState {
        &self.state
    }

    /// How many times the runtime start sequence has run. Never above one.
    pub fn start_count(&self) -> u32 {
        self.starts
    }

    pub fn environment(&self) -> Option<&Rc<Environment>> {
        match &self.state {
            BootstrapState::Ready(env) => Some(env),
            _ => None,
        }
    }

    /// Start the secondary runtime unless it already runs.
    ///
    /// Failures are fatal: the state moves to `Failed` and every later call
    /// reports the same failure without retrying.
    pub fn ensure(&mut self, host: &ScriptHost) -> Result<Rc<Environment>, BridgeError> {
        match &self.state {
            BootstrapState::Ready(env) => return Ok(Rc::clone(env)),
            BootstrapState::Initializing => return Err(BridgeError::BootstrapInProgress),
            BootstrapState::Failed(reason) => {
                return Err(BridgeError::BootstrapFailed {
                    reason: reason.clone(),
                })
            }
            BootstrapState::Uninitialized => {}
        }

        self.state = BootstrapState::Initializing;
        self.starts += 1;
        match self.start(host) {
            Ok(env) => {
                let env = Rc::new(env);
                env.link(env.context());
                info!(
                    context = %env.context().id(),
                    argv = ?env.argv(),
                    "secondary runtime ready"
                );
                self.state = BootstrapState::Ready(Rc::clone(&env));
                Ok(env)
            }
            Err(err) => {
                let reason = err.to_string();
                error!(%reason, "secondary runtime failed to start");
                self.state = BootstrapState::Failed(reason.clone());
                Err(BridgeError::BootstrapFailed { reason })
            }
        }
    }

    fn start(&self, host: &ScriptHost) -> Result<Environment, BridgeError> {
        let suppression = host.microtask_suppression();
        let _suppressed = suppression.scope();

        let mut instance = RuntimeInstance::new(self.argv.clone());
        if let Some(preload) = &self.preload {
            instance.set_preload(preload.clone());
        }
        let tick_suppression = suppression.clone();
        instance.set_tick_callback(Rc::new(move |env: &Environment| {
            let _suppressed = tick_suppression.scope();
            env.drain_ticks()
        }));

        let context = host.create_context(SECONDARY_CONTEXT_NAME)?;
        let _entered = host.enter(&context);
        context.set_security_token(SecurityToken::fresh());
        context.set_embedder_data(MARKER_SLOT, Rc::new(CONTEXT_MARKER.to_string()));

        let env = instance.start(host, &context)?;
        versions::stamp(env.context())?;
        Ok(env)
    }
}

impl Drop for Bootstrapper {
    fn drop(&mut self) {
        // The secondary context's own slot points back at the environment.
        if let BootstrapState::Ready(env) = &self.state {
            env.context().take_embedder_data(ENVIRONMENT_SLOT);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_exactly_once() {
        let host = ScriptHost::new().unwrap();
        let mut bootstrapper = Bootstrapper::new(vec!["tandem".into()]);

        let first = bootstrapper.ensure(&host).unwrap();
        for _ in 0..5 {
            let again = bootstrapper.ensure(&host).unwrap();
            assert!(Rc::ptr_eq(&first, &again));
        }
        assert_eq!(bootstrapper.start_count(), 1);
        assert!(matches!(bootstrapper.state(), BootstrapState::Ready(_)));
    }

    #[test]
    fn secondary_context_is_tagged_and_tokened() {
        let host = ScriptHost::new().unwrap();
        let mut bootstrapper = Bootstrapper::new(vec!["tandem".into()]);
        let env = bootstrapper.ensure(&host).unwrap();
        let ctx = env.context();

        assert_eq!(ctx.name(), SECONDARY_CONTEXT_NAME);
        assert!(ctx.security_token().is_some());
        assert_eq!(
            ctx.embedder_data::<String>(MARKER_SLOT).as_deref().map(String::as_str),
            Some(CONTEXT_MARKER)
        );
        assert_eq!(host.entered_context(), None);
        assert!(!host.microtask_suppression().is_active());
    }

    #[test]
    fn secondary_context_finds_its_own_environment() {
        let host = ScriptHost::new().unwrap();
        let mut bootstrapper = Bootstrapper::new(vec!["tandem".into()]);
        let env = bootstrapper.ensure(&host).unwrap();

        let found = Environment::current(env.context()).unwrap();
        assert!(Rc::ptr_eq(&found, &env));

        let secondary = env.context().clone();
        drop(bootstrapper);
        assert!(Environment::current(&secondary).is_none());
    }

    #[test]
    fn versions_are_stamped_during_bootstrap() {
        let host = ScriptHost::new().unwrap();
        let mut bootstrapper = Bootstrapper::new(vec!["tandem".into()]);
        let env = bootstrapper.ensure(&host).unwrap();

        let mut keys = env
            .context()
            .eval::<Vec<String>>("Object.keys(process.versions)")
            .unwrap();
        keys.sort();
        let mut expected: Vec<String> = versions::entries()
            .iter()
            .map(|(key, _)| key.to_string())
            .collect();
        expected.sort();
        assert_eq!(keys, expected);
    }

    #[test]
    fn failure_is_final() {
        let host = ScriptHost::new().unwrap();
        let mut bootstrapper = Bootstrapper::new(vec!["tandem".into()])
            .with_preload(Some("throw new Error('no entry point')".into()));

        let err = bootstrapper.ensure(&host).unwrap_err();
        assert!(err.to_string().contains("no entry point"));
        let err = bootstrapper.ensure(&host).unwrap_err();
        assert!(matches!(err, BridgeError::BootstrapFailed { .. }));

        assert_eq!(bootstrapper.start_count(), 1);
        assert!(matches!(bootstrapper.state(), BootstrapState::Failed(_)));
        assert!(bootstrapper.environment().is_none());
    }
}
