//! Scheme-based resolution of the process's data source.

use crate::error::{ConfigError, Result};
use crate::sources::DataSource;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Scheme used for addresses without one, such as `/etc/app.yaml`.
pub const DEFAULT_SCHEME: &str = "file";

/// Environment variable consulted by [`SourceRegistry::resolve_env`].
pub const ADDRESS_ENV: &str = "HOTSWAP_CONFIG";

/// Factory producing a data source for a parsed address.
pub type SourceFactory = Arc<dyn Fn(&SourceAddress) -> Result<Arc<dyn DataSource>> + Send + Sync>;

/// A parsed configuration address.
///
/// # Examples
///
/// ```rust
/// use hotswap_store::sources::SourceAddress;
///
/// let addr = SourceAddress::parse("http://config.local/app?watch=true", "file")?;
/// assert_eq!(addr.scheme(), "http");
/// assert_eq!(addr.query("watch").as_deref(), Some("true"));
///
/// let addr = SourceAddress::parse("/etc/app.yaml", "file")?;
/// assert_eq!(addr.scheme(), "file");
/// assert_eq!(addr.path(), std::path::PathBuf::from("/etc/app.yaml"));
/// # Ok::<(), hotswap_store::error::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SourceAddress {
    scheme: String,
    raw: String,
    url: Option<Url>,
}

impl SourceAddress {
    /// Parse `raw`, falling back to `default_scheme` when it has no usable scheme.
    ///
    /// Single-letter schemes are treated as Windows drive letters, not schemes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigAddressMissing`] for a blank address.
    pub fn parse(raw: &str, default_scheme: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ConfigError::ConfigAddressMissing);
        }

        match Url::parse(raw) {
            Ok(url) if url.scheme().len() > 1 => Ok(Self {
                scheme: url.scheme().to_string(),
                raw: raw.to_string(),
                url: Some(url),
            }),
            _ => Ok(Self {
                scheme: default_scheme.to_ascii_lowercase(),
                raw: raw.to_string(),
                url: None,
            }),
        }
    }

    /// The resolved scheme, lowercased.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The address as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The parsed URL, if the address carried a scheme.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    /// The filesystem path the address designates.
    ///
    /// `file:///etc/app.yaml` gives `/etc/app.yaml`; `file://conf/app.yaml` is
    /// read as the relative path `conf/app.yaml`; scheme-less addresses are used
    /// as they are.
    pub fn path(&self) -> PathBuf {
        let Some(url) = &self.url else {
            return PathBuf::from(&self.raw);
        };
        if let Ok(path) = url.to_file_path() {
            return path;
        }
        match url.host_str() {
            Some(host) => PathBuf::from(format!("{}{}", host, url.path())),
            None => PathBuf::from(url.path()),
        }
    }

    /// The first value of query parameter `name`.
    pub fn query(&self, name: &str) -> Option<String> {
        self.url.as_ref().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned())
        })
    }
}

/// Maps address schemes to data source factories.
///
/// Exactly one source is active per process: the one resolved from the first
/// configuration address.
///
/// # Examples
///
/// ```rust
/// use hotswap_store::prelude::*;
/// use hotswap_store::sources::SourceAddress;
///
/// let mut registry = SourceRegistry::new();
/// registry.register("apollo", |addr: &SourceAddress| {
///     Err(ConfigError::SourceError(format!("not wired up: {}", addr.raw())))
/// });
///
/// assert!(registry.resolve("apollo://host?appId=X").is_err());
/// assert!(matches!(
///     registry.resolve("etcd://host/key").err(),
///     Some(ConfigError::UnknownScheme(s)) if s == "etcd"
/// ));
/// ```
pub struct SourceRegistry {
    factories: HashMap<String, SourceFactory>,
    default_scheme: String,
}

impl SourceRegistry {
    /// An empty registry using [`DEFAULT_SCHEME`] for scheme-less addresses.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
            default_scheme: DEFAULT_SCHEME.to_string(),
        }
    }

    /// A registry with the built-in sources compiled into this build:
    /// `file` (feature `file-watch`), `http` (feature `remote`) and `https`
    /// (feature `remote-tls`).
    pub fn with_defaults() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "file-watch")]
        registry.register("file", |addr: &SourceAddress| {
            let source = crate::sources::FileSource::new(addr.path())?;
            Ok(Arc::new(source) as Arc<dyn DataSource>)
        });

        #[cfg(feature = "remote")]
        for scheme in crate::sources::remote::SCHEMES {
            registry.register(scheme, |addr: &SourceAddress| {
                let source = crate::sources::HttpSource::builder()
                    .with_url(addr.raw())
                    .build()?;
                Ok(Arc::new(source) as Arc<dyn DataSource>)
            });
        }

        registry
    }

    /// Use `scheme` for addresses that carry none.
    pub fn default_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.default_scheme = scheme.into().to_ascii_lowercase();
        self
    }

    /// Register (or replace) the factory for `scheme`.
    pub fn register<F>(&mut self, scheme: &str, factory: F)
    where
        F: Fn(&SourceAddress) -> Result<Arc<dyn DataSource>> + Send + Sync + 'static,
    {
        self.factories
            .insert(scheme.to_ascii_lowercase(), Arc::new(factory));
    }

    /// Registered schemes, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }

    /// Build the data source for `address`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ConfigAddressMissing`] for a blank address
    /// - [`ConfigError::UnknownScheme`] if no factory handles the scheme
    /// - whatever the factory returns
    pub fn resolve(&self, address: &str) -> Result<Arc<dyn DataSource>> {
        let address = SourceAddress::parse(address, &self.default_scheme)?;
        let factory = self
            .factories
            .get(address.scheme())
            .ok_or_else(|| ConfigError::UnknownScheme(address.scheme().to_string()))?;

        let source = factory(&address)?;
        info!(scheme = %address.scheme(), source = %source.name(), "data source resolved");
        Ok(source)
    }

    /// Build the data source for the first of `addresses`; the rest are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigAddressMissing`] if `addresses` is empty,
    /// otherwise as [`SourceRegistry::resolve`].
    pub fn resolve_first<I, S>(&self, addresses: I) -> Result<Arc<dyn DataSource>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let first = addresses
            .into_iter()
            .next()
            .ok_or(ConfigError::ConfigAddressMissing)?;
        self.resolve(first.as_ref())
    }

    /// Build the data source for the address in [`ADDRESS_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ConfigAddressMissing`] if the variable is unset or
    /// not valid unicode, otherwise as [`SourceRegistry::resolve`].
    pub fn resolve_env(&self) -> Result<Arc<dyn DataSource>> {
        self.resolve_var(ADDRESS_ENV)
    }

    fn resolve_var(&self, name: &str) -> Result<Arc<dyn DataSource>> {
        let address = std::env::var(name).map_err(|_| ConfigError::ConfigAddressMissing)?;
        self.resolve(&address)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
