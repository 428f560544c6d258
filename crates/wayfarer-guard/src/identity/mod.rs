//! Identity providers.
//!
//! - [`StaticIdentity`]: fixed token table, hashed at load time
//! - [`HttpIdentity`]: delegates to a remote auth service (feature `http`)

mod memory;

#[cfg(feature = "http")]
mod http;

pub use memory::StaticIdentity;

#[cfg(feature = "http")]
pub use http::HttpIdentity;
