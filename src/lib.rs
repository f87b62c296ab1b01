//! capi-compat - newest-spelling native API across host runtime releases
//!
//! Native extensions of a reference-counted managed-object runtime are
//! written against its native API, which grows release by release: accessor
//! functions appear, direct field access is phased out. This crate lets
//! extension code always use the newest spelling of each operation.
//!
//! # Features
//! - Target runtime release chosen once at build time (`HOST_RUNTIME_VERSION`)
//! - Per-operation version gate with exact thresholds
//! - Polyfills that reproduce the native ownership contract (new vs borrowed)
//! - Owning and borrowing handle types on top of the raw catalogue
//!
//! # Example
//! ```ignore
//! use capi_compat::{compat, host};
//!
//! let rt = host::Runtime::initialize();
//! let frame = unsafe { compat::thread_state_get_frame_borrow(rt.main_thread()) };
//! assert!(frame.is_null());
//! ```

// Target version and operation gate (shared with build.rs)
pub mod gate;
pub mod version;

// Host runtime native API
pub mod host;

// Compatibility provision layer
pub mod compat;

// Typed handles and errors
pub mod error;
pub mod handle;

pub use error::{CompatError, Result};
pub use gate::{Operation, Provision};
pub use version::{ReleaseLevel, RuntimeVersion, VersionError};

/// Host runtime release this crate was built for
pub const TARGET: RuntimeVersion = include!(concat!(env!("OUT_DIR"), "/target_version.rs"));
