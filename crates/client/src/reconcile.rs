//! Reconciliation of the local cart against the remote snapshot.

use foody_core::{CartState, RemoteCartSnapshot};

/// Outcome of [`reconcile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Local state stands as it is.
    Kept,
    /// Local state must be replaced wholesale by these lines.
    Adopted(CartState),
}

/// Align the local cart with the server's.
///
/// The remote snapshot wins wholesale when it holds at least one line and
/// its set of menu ids differs from the local one. Quantities alone never
/// trigger a replacement; an absent or empty snapshot never does either,
/// so a guest cart survives an empty server cart.
#[must_use]
pub fn reconcile(local: &CartState, remote: Option<&RemoteCartSnapshot>) -> Reconciled {
    let Some(remote) = remote.filter(|snapshot| !snapshot.is_empty()) else {
        return Reconciled::Kept;
    };

    if local.menu_ids() == remote.menu_ids() {
        Reconciled::Kept
    } else {
        Reconciled::Adopted(CartState::from_lines(remote.to_lines()))
    }
}
