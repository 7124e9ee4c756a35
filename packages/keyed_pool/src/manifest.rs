use std::fs;
use std::path::Path;
use std::vec;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{Error, PoolSpec, Result};

/// An ordered list of [`PoolSpec`] entries loaded from a TOML document.
///
/// Each pool is declared as an entry of the `pool` array of tables. The `count` field may be
/// omitted, in which case the pool is registered with no objects.
///
/// ```toml
/// [[pool]]
/// key = "bullet"
/// template = "prefabs/bullet"
/// count = 32
///
/// [[pool]]
/// key = "explosion"
/// template = "prefabs/explosion"
/// count = 4
/// ```
///
/// The manifest keeps the declaration order. It does not reject duplicate keys itself; that
/// happens when the specs are used to build a registry, whatever their source.
///
/// # Examples
///
/// ```
/// use keyed_pool::{PoolManifest, PoolRegistry};
///
/// let manifest = PoolManifest::<String, String>::from_toml_str(
///     r#"
///     [[pool]]
///     key = "bullet"
///     template = "prefabs/bullet"
///     count = 32
///     "#,
/// )?;
///
/// let registry = PoolRegistry::new(manifest, |template: &String| template.clone())?;
/// assert_eq!(registry.capacity(&"bullet".to_string()), Some(32));
/// # Ok::<(), keyed_pool::Error>(())
/// ```
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(
    deny_unknown_fields,
    bound(deserialize = "K: Deserialize<'de>, R: Deserialize<'de>")
)]
pub struct PoolManifest<K, R> {
    #[serde(default, rename = "pool")]
    pools: Vec<PoolSpec<K, R>>,
}

impl<K, R> PoolManifest<K, R>
where
    K: DeserializeOwned,
    R: DeserializeOwned,
{
    /// Parses a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the text is not valid TOML or does not describe a
    /// list of pools, for example because a count is negative or a field is misspelled.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let manifest: Self = toml::from_str(text).map_err(|e| Error::Configuration {
            key: String::new(),
            problem: e.to_string(),
        })?;

        debug!(pools = manifest.len(), "parsed pool manifest");

        Ok(manifest)
    }

    /// Reads and parses a manifest from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ManifestIo`] if the file cannot be read and [`Error::Configuration`] if
    /// its contents are not a valid manifest.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let text = fs::read_to_string(path).map_err(|source| Error::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = %path.display(), "read pool manifest");

        Self::from_toml_str(&text)
    }
}

impl<K, R> PoolManifest<K, R> {
    /// The declared pools, in declaration order.
    #[must_use]
    pub fn specs(&self) -> &[PoolSpec<K, R>] {
        &self.pools
    }

    /// The number of declared pools.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pools.len()
    }

    /// Whether the manifest declares no pools.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }

    /// Consumes the manifest, returning the declared pools in declaration order.
    #[must_use]
    pub fn into_specs(self) -> Vec<PoolSpec<K, R>> {
        self.pools
    }
}

impl<K, R> IntoIterator for PoolManifest<K, R> {
    type Item = PoolSpec<K, R>;
    type IntoIter = vec::IntoIter<PoolSpec<K, R>>;

    fn into_iter(self) -> Self::IntoIter {
        self.pools.into_iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq)]
    #[serde(rename_all = "snake_case")]
    enum Effect {
        Smoke,
        Spark,
    }

    #[test]
    fn parses_pools_in_declaration_order() {
        let manifest = PoolManifest::<Effect, String>::from_toml_str(
            r#"
            [[pool]]
            key = "spark"
            template = "fx/spark"
            count = 16

            [[pool]]
            key = "smoke"
            template = "fx/smoke"
            "#,
        )
        .unwrap();

        assert_eq!(manifest.len(), 2);
        assert_eq!(
            manifest.specs(),
            [
                PoolSpec::new(Effect::Spark, "fx/spark".to_string(), 16),
                PoolSpec::new(Effect::Smoke, "fx/smoke".to_string(), 0),
            ]
        );
    }

    #[test]
    fn keys_and_templates_need_no_default() {
        #[derive(Debug, Deserialize, Eq, PartialEq)]
        struct Prefab {
            path: String,
        }

        let manifest = PoolManifest::<Effect, Prefab>::from_toml_str(
            r#"
            [[pool]]
            key = "smoke"
            template = { path = "fx/smoke" }
            count = 4
            "#,
        )
        .unwrap();

        let spec = &manifest.specs()[0];
        assert_eq!(*spec.key(), Effect::Smoke);
        assert_eq!(spec.template().path, "fx/smoke");
        assert_eq!(spec.count(), 4);
    }

    #[test]
    fn empty_document_declares_no_pools() {
        let manifest = PoolManifest::<String, String>::from_toml_str("").unwrap();

        assert!(manifest.is_empty());
        assert!(manifest.into_specs().is_empty());
    }

    #[test]
    fn negative_count_is_rejected() {
        let result = PoolManifest::<String, String>::from_toml_str(
            r#"
            [[pool]]
            key = "a"
            template = "a"
            count = -1
            "#,
        );

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn misspelled_field_is_rejected() {
        let result = PoolManifest::<String, String>::from_toml_str(
            r#"
            [[pool]]
            key = "a"
            template = "a"
            cuont = 3
            "#,
        );

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn unknown_key_variant_is_rejected() {
        let result = PoolManifest::<Effect, String>::from_toml_str(
            r#"
            [[pool]]
            key = "fire"
            template = "fx/fire"
            "#,
        );

        assert!(matches!(result, Err(Error::Configuration { .. })));
    }

    #[test]
    fn reads_manifest_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[pool]]\nkey = 3\ntemplate = true\ncount = 2").unwrap();

        let manifest = PoolManifest::<u32, bool>::from_path(file.path()).unwrap();

        assert_eq!(manifest.into_specs(), [PoolSpec::new(3, true, 2)]);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = PoolManifest::<u32, u32>::from_path(dir.path().join("missing.toml"));

        assert!(matches!(result, Err(Error::ManifestIo { .. })));
    }
}
