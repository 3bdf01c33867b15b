use interned::PoolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error("shared string pool is already initialized")]
    AlreadyInitialized,
}
