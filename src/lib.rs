//! Process-wide interned string pool
//!
//! The pool itself lives in the [`interned`] crate; this crate resolves its
//! dimensions from configuration and installs it as [`Pool::shared`].
//!
//! ```no_run
//! let pool = strpool::init().expect("string pool configuration");
//! let name = pool.get_or_add("request-id");
//! assert_eq!(name, "request-id");
//! ```

pub mod config;
mod error;

pub use config::Config;
pub use error::Error;
pub use interned::{
    CharCache, DEFAULT_BUCKET_CAPACITY, DEFAULT_BUCKET_COUNT, Pool, PoolConfig, PoolError,
    PooledStr, encoding_rs, hash,
};

/// Load `.env`, resolve [`Config`] and install the shared pool
///
/// Must run before anything touches [`Pool::shared`], otherwise the default
/// pool already exists and [`Error::AlreadyInitialized`] is returned.
pub fn init() -> Result<&'static Pool, Error> {
    load_dotenv();
    install(Config::load()?)
}

/// Build a pool from `config` and make it the shared pool
pub fn install(config: Config) -> Result<&'static Pool, Error> {
    let pool = Pool::with_config(config.pool)?;
    let shared = Pool::install_shared(pool).map_err(|_| Error::AlreadyInitialized)?;
    tracing::info!(
        bucket_count = shared.bucket_count(),
        bucket_capacity = shared.bucket_capacity(),
        "shared string pool installed"
    );
    Ok(shared)
}

fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load environment file"),
    }
}
