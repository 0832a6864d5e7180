//! tailor Loader
//!
//! Reads manifests from build directories, local or remote, and drives
//! whole builds.
//!
//! # Core Concepts
//!
//! - [`FileLoader`]: Reads files under a root, enforcing [`LoadRestriction`]
//! - [`Fetcher`]: Materializes remote bases into staging directories
//! - [`BuildConfig`]: Contents of a `tailor.yaml` build file
//! - [`Builder`]: Loads, merges and transforms a build directory
//!
//! # Example
//!
//! ```rust,no_run
//! use tailor_loader::Builder;
//!
//! let output = Builder::new().build("overlays/dev").unwrap();
//! print!("{}", output.render().unwrap());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod builder;
mod config;
mod error;
mod loader;
mod remote;

// Re-exports
pub use builder::{BuildOutput, Builder};
pub use config::{BuildConfig, BUILD_FILE};
pub use error::{BuildError, LoaderError};
pub use loader::{FileLoader, LoadRestriction};
pub use remote::{is_remote_target, Fetcher, GitFetcher, RemoteTarget};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
