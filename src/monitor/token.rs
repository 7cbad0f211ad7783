use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide source of token identities.
///
/// A single counter shared by every monitor keeps identities unique across
/// monitors, so a token minted by one monitor can never satisfy the ownership
/// check of another.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Proof of occupancy of a monitor section.
///
/// An `OwnerToken` is minted every time the section is granted and becomes
/// invalid the instant the section is released. It is opaque: the only thing a
/// monitor ever does with it is compare it against the token it most recently
/// minted. Tokens are deliberately not `Clone`, so the capability cannot be
/// duplicated; it can only be presented back.
///
/// The token also carries a reentrancy depth. The public protocol always mints
/// depth 1 and exposes no way to increment it; the field exists so a condition
/// wait can restore whatever depth was in effect before the section was
/// released mid-wait.
#[derive(Debug)]
pub struct OwnerToken {
    /// Identity compared against the monitor's current owner.
    id: u64,

    /// Reentrancy depth, preserved across condition waits.
    depth: u32,
}

impl OwnerToken {
    /// Mints a token with a fresh process-wide identity.
    pub(crate) fn mint(depth: u32) -> OwnerToken {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            depth,
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    pub(crate) fn depth(&self) -> u32 {
        self.depth
    }
}
