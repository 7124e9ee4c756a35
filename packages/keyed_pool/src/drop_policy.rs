/// Determines what happens when a registry is dropped while some of its objects are still
/// checked out.
///
/// Parked objects are always dropped together with the registry. Checked out objects are owned
/// by their callers, so the registry cannot reclaim them.
///
/// By default, the registry allows being dropped with objects still checked out.
///
/// # Examples
///
/// ```
/// use keyed_pool::{DropPolicy, PoolRegistry, PoolSpec};
///
/// // The drop policy is set at registry creation time.
/// let registry = PoolRegistry::builder()
///     .drop_policy(DropPolicy::MustNotAbandonCheckedOut)
///     .build([PoolSpec::new("orb", (), 3)], |_: &()| 0_u8)?;
/// # Ok::<(), keyed_pool::Error>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[non_exhaustive]
pub enum DropPolicy {
    /// The registry may be dropped while objects are checked out. This is the default.
    #[default]
    MayAbandonCheckedOut,

    /// The registry will panic if it is dropped while any object is checked out.
    ///
    /// This is useful to detect objects that are never returned to their pool, as such leaks
    /// otherwise only show up as premature pool exhaustion.
    MustNotAbandonCheckedOut,
}
