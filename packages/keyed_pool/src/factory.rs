/// Creates new instances for a pool from a template.
///
/// The registry calls the factory only while it is being built, `count` times for each
/// [`PoolSpec`][crate::PoolSpec]. Instances are expected to come out of the factory in a state
/// that is safe to park; the registry requests parking from the
/// [`PlacementSink`][crate::PlacementSink] immediately afterwards.
///
/// Any `FnMut(&R) -> T` closure is a factory.
///
/// # Examples
///
/// ```
/// use keyed_pool::InstanceFactory;
///
/// #[derive(Debug)]
/// struct Counter(u32);
///
/// impl InstanceFactory<u32, Vec<u32>> for Counter {
///     fn instantiate(&mut self, template: &u32) -> Vec<u32> {
///         self.0 += 1;
///         vec![*template; self.0 as usize]
///     }
/// }
///
/// let mut factory = Counter(0);
/// assert_eq!(factory.instantiate(&5), vec![5]);
/// assert_eq!(factory.instantiate(&5), vec![5, 5]);
/// ```
pub trait InstanceFactory<R, T> {
    /// Creates one new instance from `template`, transferring its ownership to the caller.
    fn instantiate(&mut self, template: &R) -> T;
}

impl<R, T, F> InstanceFactory<R, T> for F
where
    F: FnMut(&R) -> T,
{
    fn instantiate(&mut self, template: &R) -> T {
        self(template)
    }
}
