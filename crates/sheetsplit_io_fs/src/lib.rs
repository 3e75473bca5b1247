//! `sheetsplit_io_fs` v1:
//! Destination naming and atomic publishing for split workbooks.
//!
//! Modules:
//! - `conf`    : naming constants
//! - `spec`    : options/errors
//! - `path`    : candidate path builders
//! - `publish` : temp-file staging and no-clobber rename
//! - `util`    : shared helper functions

pub mod conf;
pub mod path;
pub mod publish;
pub mod spec;
mod util;

pub use conf::{C_SUFFIX_SPLIT_DEFAULT, N_ATTEMPTS_DESTINATION_MAX};
pub use path::{DestinationPathBuilder, SplitSuffixPathBuilder, derive_available_path};
pub use publish::publish_bytes;
pub use spec::{PublishError, SpecDestinationOptions};
