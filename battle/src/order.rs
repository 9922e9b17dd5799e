//! Canonical battler ordering.
//!
//! Each peer stores its own battlers in local slots (even = mine, odd =
//! theirs), so the same logical battler occupies different indices on the
//! two machines. Peer-order-sensitive operations (priority, end-of-round
//! switch resolution, target lookup) must walk battlers in the same
//! relative sequence on both sides, which the canonical ordering provides.
//!
//! Two distinct permutations that must not be conflated:
//! - [`battler_order`] reorders a *local* battler-indexed collection into
//!   the session-wide agreed sequence.
//! - [`target_order`] remaps a *target* slot from the sender's point of
//!   view into the receiver's.

/// Maximum battler slots a session can address.
pub const BATTLER_SLOTS: usize = 6;

/// Which of the two session peers this process is, assigned by the server
/// in the `found` record. Selects the canonical orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientId {
    Zero,
    One,
}

impl ClientId {
    pub fn parse(v: i64) -> Option<Self> {
        match v {
            0 => Some(ClientId::Zero),
            1 => Some(ClientId::One),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ClientId::Zero => 0,
            ClientId::One => 1,
        }
    }
}

/// Permutation applied to local battler-indexed collections so both peers
/// walk the same logical sequence.
pub fn battler_order(id: ClientId) -> [usize; BATTLER_SLOTS] {
    match id {
        ClientId::Zero => [0, 1, 2, 3, 4, 5],
        ClientId::One => [1, 0, 3, 2, 5, 4],
    }
}

/// Permutation from a sender-relative target slot to the receiver's point
/// of view. Identical for both ids: "my slot 0" is always "your slot 1".
pub fn target_order(_id: ClientId) -> [usize; BATTLER_SLOTS] {
    [1, 0, 3, 2, 5, 4]
}

/// Remap a target slot into the opposing peer's point of view. Sentinel
/// and out-of-range values pass through untouched.
pub fn remap_target(id: ClientId, target: i64) -> i64 {
    let order = target_order(id);
    match usize::try_from(target) {
        Ok(slot) if slot < BATTLER_SLOTS => order[slot] as i64,
        _ => target,
    }
}

/// Run `f` over `items` permuted into canonical order, restoring the
/// original order before returning. The reordered view never leaks past
/// the call. `items` must cover whole battler pairs (length 2, 4, or 6).
pub fn with_battler_order<T, R>(
    items: &mut [T],
    id: ClientId,
    f: impl FnOnce(&mut [T]) -> R,
) -> R {
    debug_assert!(items.len() <= BATTLER_SLOTS && items.len() % 2 == 0);
    let order = &battler_order(id)[..items.len()];
    apply_permutation(items, order);
    let result = f(items);
    apply_permutation(items, &invert(order));
    result
}

/// In place, `items[i] <- old items[order[i]]`.
fn apply_permutation<T>(items: &mut [T], order: &[usize]) {
    let mut order = order.to_vec();
    for i in 0..order.len() {
        while order[i] != i {
            let j = order[i];
            items.swap(i, j);
            order.swap(i, j);
        }
    }
}

fn invert(order: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; order.len()];
    for (i, &o) in order.iter().enumerate() {
        inverse[o] = i;
    }
    inverse
}

/// Slot indices owned by the local peer, in canonical processing order.
pub fn local_slots(double_battle: bool) -> &'static [usize] {
    if double_battle { &[0, 2] } else { &[0] }
}

/// Slot indices owned by the remote peer, in the order its choices arrive.
pub fn remote_slots(double_battle: bool) -> &'static [usize] {
    if double_battle { &[1, 3] } else { &[1] }
}
