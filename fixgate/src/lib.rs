//! fixgate - Trusted device location acquisition
//!
//! This library coordinates a device location backend: it obtains permission,
//! checks provider settings, subscribes to updates and filters out mock or
//! spoofed fixes before handing them to the application.
//!
//! # High-Level API
//!
//! ```ignore
//! use fixgate::acquisition::{ChannelHost, Coordinator, CoordinatorService};
//! use fixgate::config::FileConfig;
//!
//! let config = FileConfig::load_from(Path::new("fixgate.ini"))?;
//! let _guard = fixgate::logging::init_logging(&config.logging)?;
//!
//! let (coordinator, events) = Coordinator::new(config.location, backend, platform)?;
//! let service = CoordinatorService::start(coordinator, events);
//! ```

pub mod acquisition;
pub mod config;
pub mod logging;

/// Version of the fixgate library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
