//! Code shared between the `jenkinsapi` command-line tools.

#![deny(unsafe_code)]
#![warn(missing_docs)]
// If we do this, it's generally deliberate (because a future version of the
// struct might contain floats, which don't support `Eq`).
#![allow(clippy::derive_partial_eq_without_eq)]

pub use reqwest;
pub use semver;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;
pub use url;

pub mod errors;
pub mod models;
pub mod rest_api;
pub mod tracing_support;

/// Common imports used by many modules.
pub mod prelude {
    pub use std::{fmt, time::Duration};

    pub use anyhow::{format_err, Context};
    pub use serde::{Deserialize, Serialize};
    pub use tracing::{
        debug, debug_span, error, error_span, info, info_span, instrument, trace,
        trace_span, warn, warn_span,
    };
    pub use url::Url;

    pub use super::{errors::JenkinsError, models::*, Error, Result};
}

/// Error type for this crate's functions.
pub use anyhow::Error;
/// Result type for this crate's functions.
pub use anyhow::Result;

/// The version of `jenkinsapi_common` that we're using. All of our
/// command-line tools report this version.
pub fn jenkinsapi_common_version() -> semver::Version {
    env!("CARGO_PKG_VERSION")
        .parse::<semver::Version>()
        .expect("could not parse built-in version")
}

#[test]
fn version_matches_package() {
    assert_eq!(
        jenkinsapi_common_version().to_string(),
        env!("CARGO_PKG_VERSION")
    );
}
