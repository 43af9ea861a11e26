use bitflags::bitflags;

bitflags! {
    /// Per-node state bits.
    ///
    /// All bits start cleared except `DIRTY`, which a freshly created node
    /// carries so that it is recomputed once before its first render.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct EntityFlags: u8 {
        /// Removed and destroyed by its parent on the next update pass.
        const DEAD     = 1 << 0;
        /// Skipped by the update and render passes (with its subtree).
        const DISABLED = 1 << 1;
        /// Set once `init` ran; cleared again by `destroy`.
        const INIT     = 1 << 2;
        /// Cached placement data is stale somewhere in this subtree.
        const DIRTY    = 1 << 3;
        /// Pointer is over this entity this frame.
        const HOVERED  = 1 << 4;
    }
}

impl EntityFlags {
    /// Bits whose change does not itself require a recompute.
    pub const TRANSIENT: Self = Self::DIRTY.union(Self::HOVERED);

    /// Whether toggling `flag` must mark the node dirty.
    #[inline]
    #[must_use]
    pub fn dirties_on_change(flag: Self) -> bool {
        !Self::TRANSIENT.contains(flag)
    }
}
