use std::fmt;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::{Compressor, Config, Decompressor, FallbackProvider, NativeProvider, Result};

/// Factory of compression and decompression streams for one backend.
pub trait ZlibProvider: fmt::Debug + Send + Sync {
    /// Open a new compressor.
    fn create_compressor(&self) -> Result<Box<dyn Compressor + Send>>;

    /// Open a new decompressor.
    fn create_decompressor(&self) -> Result<Box<dyn Decompressor + Send>>;

    /// Whether streams from this provider run on the native zlib.
    fn is_accelerated(&self) -> bool;
}

#[derive(Debug)]
enum Backend {
    Native(NativeProvider),
    Fallback(FallbackProvider),
}

/// The backend chosen for this process.
///
/// The choice is made once, in [`Zlib::new`], and never revisited. Construct one at startup and
/// pass it to whatever needs streams, or use the lazily initialised [`Zlib::global`].
#[derive(Debug)]
pub struct Zlib {
    backend: Backend,
}

impl Zlib {
    /// Select a backend: the native one unless it is disabled or fails to load.
    ///
    /// Load failures are logged and never returned.
    pub fn new(config: &Config) -> Self {
        let backend = if config.disable_accelerated {
            info!("native zlib disabled by configuration, using fallback provider");
            Backend::Fallback(FallbackProvider::new(config.level))
        } else {
            match NativeProvider::load(config.native_library.as_deref(), config.level) {
                Ok(provider) => {
                    info!(version = provider.version(), "using native zlib provider");
                    Backend::Native(provider)
                }
                Err(err) => {
                    debug!(error = ?err, "failed to load native zlib");
                    warn!("could not load native zlib provider, falling back on flate2 provider");
                    Backend::Fallback(FallbackProvider::new(config.level))
                }
            }
        };
        Self { backend }
    }

    /// The process-wide instance, configured from the environment on first use.
    ///
    /// See [`Config::from_env`] for the variables read.
    pub fn global() -> &'static Zlib {
        static GLOBAL: OnceCell<Zlib> = OnceCell::new();
        GLOBAL.get_or_init(|| {
            let config = Config::from_env().unwrap_or_else(|err| {
                warn!(%err, "ignoring invalid zlib configuration in environment");
                Config::default()
            });
            Zlib::new(&config)
        })
    }

    /// The selected provider.
    pub fn provider(&self) -> &dyn ZlibProvider {
        match &self.backend {
            Backend::Native(provider) => provider,
            Backend::Fallback(provider) => provider,
        }
    }

    /// Whether the native backend was selected.
    pub fn supports_accelerated(&self) -> bool {
        matches!(self.backend, Backend::Native(_))
    }

    /// Open a new compressor on the selected backend.
    pub fn create_compressor(&self) -> Result<Box<dyn Compressor + Send>> {
        self.provider().create_compressor()
    }

    /// Open a new decompressor on the selected backend.
    pub fn create_decompressor(&self) -> Result<Box<dyn Decompressor + Send>> {
        self.provider().create_decompressor()
    }
}

impl ZlibProvider for Zlib {
    fn create_compressor(&self) -> Result<Box<dyn Compressor + Send>> {
        Zlib::create_compressor(self)
    }

    fn create_decompressor(&self) -> Result<Box<dyn Decompressor + Send>> {
        Zlib::create_decompressor(self)
    }

    fn is_accelerated(&self) -> bool {
        self.supports_accelerated()
    }
}
