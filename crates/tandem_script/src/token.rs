//! Security tokens gating cross-context value exchange

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque token attached to a context.
///
/// Two contexts may exchange values only when they carry the same token.
/// Equality is identity: every [`SecurityToken::fresh`] call yields a token
/// equal to nothing minted before it.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SecurityToken(u64);

impl SecurityToken {
    pub fn fresh() -> Self {
        SecurityToken(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Debug for SecurityToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityToken(#{})", self.0)
    }
}
