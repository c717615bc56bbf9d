//! Service configuration.
//!
//! Configuration is layered: an optional TOML file underneath
//! `DIGCOLL_RETRIEVER_`-prefixed environment variables, so a deployment can
//! run on environment variables alone. The loaded value is read-only for the
//! rest of the process: backends receive `&Config` at construction and the
//! cache/server components take what they need from it once.
//!
//! ```toml
//! bind = "127.0.0.1:8080"
//! verbosity = "info"
//! flat_tif_dir_root = "/masters/tifs"
//! flat_jpg_dir_root = "/masters/jpgs"
//!
//! [mvol]
//! owncloud_root = "/mnt/owncloud"
//! owncloud_user = "ldr_oc_admin"
//! owncloud_subpath = "Preservation Unit"
//!
//! [cache]
//! enabled = true
//! ttl_seconds = 300
//! ```
//!
//! Backend roots are optional: a family whose root is absent still claims its
//! identifiers, and retrieval fails with a configuration error rather than a
//! misleading not-found.

use confique::Config as Confique;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Confique)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[config(default = "127.0.0.1:8080", env = "DIGCOLL_RETRIEVER_BIND")]
    pub bind: String,

    /// Log verbosity (`error`, `warn`, `info`, `debug`, `trace`). `RUST_LOG`
    /// takes precedence when set.
    #[config(env = "DIGCOLL_RETRIEVER_VERBOSITY")]
    pub verbosity: Option<String>,

    /// Root directory of the flat tif family.
    #[config(env = "DIGCOLL_RETRIEVER_FLAT_TIF_DIR_ROOT")]
    pub flat_tif_dir_root: Option<PathBuf>,

    /// Root directory of the flat jpg families.
    #[config(env = "DIGCOLL_RETRIEVER_FLAT_JPG_DIR_ROOT")]
    pub flat_jpg_dir_root: Option<PathBuf>,

    #[config(nested)]
    pub mvol: MvolConfig,

    #[config(nested)]
    pub cache: CacheConfig,
}

/// Owncloud mount coordinates for the mvol families.
#[derive(Debug, Clone, Confique)]
pub struct MvolConfig {
    #[config(env = "DIGCOLL_RETRIEVER_MVOL_OWNCLOUD_ROOT")]
    pub owncloud_root: Option<PathBuf>,

    #[config(env = "DIGCOLL_RETRIEVER_MVOL_OWNCLOUD_USER")]
    pub owncloud_user: Option<String>,

    #[config(env = "DIGCOLL_RETRIEVER_MVOL_OWNCLOUD_SUBPATH")]
    pub owncloud_subpath: Option<String>,
}

/// Transformed-result cache settings.
#[derive(Debug, Clone, Confique)]
pub struct CacheConfig {
    /// Disabled by default; retrieval behaves identically without it.
    #[config(default = false, env = "DIGCOLL_RETRIEVER_CACHE_ENABLED")]
    pub enabled: bool,

    /// Entry lifetime. Re-armed in full on every cache read.
    #[config(default = 300, env = "DIGCOLL_RETRIEVER_CACHE_TTL_SECONDS")]
    pub ttl_seconds: u64,
}

impl Config {
    /// Load from the environment, layered over `path` when it exists.
    pub fn load(path: &Path) -> Result<Self, confique::Error> {
        let mut builder = Self::builder().env();
        if path.exists() {
            builder = builder.file(path);
        }
        builder.load()
    }

    /// A configuration with nothing set beyond the defaults. Embedders and
    /// tests fill in the backend roots they need.
    pub fn empty() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            verbosity: None,
            flat_tif_dir_root: None,
            flat_jpg_dir_root: None,
            mvol: MvolConfig {
                owncloud_root: None,
                owncloud_user: None,
                owncloud_subpath: None,
            },
            cache: CacheConfig {
                enabled: false,
                ttl_seconds: 300,
            },
        }
    }
}
