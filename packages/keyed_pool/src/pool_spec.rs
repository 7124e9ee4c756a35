use serde::Deserialize;

/// Declares one pool of a [`PoolRegistry`][crate::PoolRegistry]: which key it is registered
/// under, which template its instances are created from and how many instances to create.
///
/// The template is opaque to the registry. It is only ever handed to the
/// [`InstanceFactory`][crate::InstanceFactory] that creates the instances.
///
/// # Examples
///
/// ```
/// use keyed_pool::PoolSpec;
///
/// let spec = PoolSpec::new("bullet", "prefabs/bullet", 32);
///
/// assert_eq!(*spec.key(), "bullet");
/// assert_eq!(spec.count(), 32);
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PoolSpec<K, R> {
    key: K,
    template: R,

    #[serde(default)]
    count: usize,
}

impl<K, R> PoolSpec<K, R> {
    /// Creates a spec for a pool of `count` instances of `template`, registered under `key`.
    ///
    /// A `count` of zero is valid and registers the key with an empty pool.
    #[must_use]
    pub fn new(key: K, template: R, count: usize) -> Self {
        Self {
            key,
            template,
            count,
        }
    }

    /// The key the pool is registered under.
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The template that instances of this pool are created from.
    #[must_use]
    pub fn template(&self) -> &R {
        &self.template
    }

    /// The number of instances created for this pool.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    pub(crate) fn into_parts(self) -> (K, R, usize) {
        (self.key, self.template, self.count)
    }
}
