//! Core traits for landmem configuration.
//!
//! The primary trait is [`ConfigProvider`], which abstracts over where the
//! single collection identifier and the data directory come from. The
//! collection is passed once at construction time and threaded through every
//! store call; nothing in landmem reads it from a process-wide constant.

use std::path::PathBuf;

use crate::Result;

/// Default collection (table/namespace) owned by a landmem deployment.
pub const DEFAULT_COLLECTION: &str = "land_memories";

/// Trait for deployment configuration.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use landmem_core::traits::ConfigProvider;
/// use landmem_core::Result;
///
/// #[derive(Clone)]
/// struct CityConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for CityConfig {
///     fn project_name(&self) -> &str {
///         "neo-city"
///     }
///
///     fn collection(&self) -> &str {
///         "neo_city_plots"
///     }
///
///     fn data_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// The collection/table/partition this deployment owns.
    ///
    /// Every create, lookup, predicate query, and similarity search is
    /// constrained to this collection.
    fn collection(&self) -> &str {
        DEFAULT_COLLECTION
    }

    /// Directory holding store data (snapshots, LanceDB tables).
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn data_path(&self) -> Result<PathBuf>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone)]
    struct TestConfig {
        name: String,
        base: PathBuf,
    }

    impl ConfigProvider for TestConfig {
        fn project_name(&self) -> &str {
            &self.name
        }

        fn data_path(&self) -> Result<PathBuf> {
            Ok(self.base.clone())
        }
    }

    #[derive(Clone)]
    struct NamedCollection;

    impl ConfigProvider for NamedCollection {
        fn project_name(&self) -> &str {
            "named"
        }

        fn collection(&self) -> &str {
            "harbor_plots"
        }

        fn data_path(&self) -> Result<PathBuf> {
            Err(crate::Error::config("no data dir"))
        }
    }

    #[test]
    fn test_config_provider_project_name() {
        let config = TestConfig {
            name: "test-project".into(),
            base: PathBuf::from("/tmp/test"),
        };
        assert_eq!(config.project_name(), "test-project");
    }

    #[test]
    fn test_config_provider_default_collection() {
        let config = TestConfig {
            name: "test".into(),
            base: PathBuf::from("/data"),
        };
        assert_eq!(config.collection(), DEFAULT_COLLECTION);
        assert_eq!(config.data_path().unwrap(), PathBuf::from("/data"));
    }

    #[test]
    fn test_config_provider_custom_collection() {
        let config = NamedCollection;
        assert_eq!(config.collection(), "harbor_plots");
        assert!(config.data_path().is_err());
    }

    #[test]
    fn test_config_provider_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<TestConfig>();
    }
}
