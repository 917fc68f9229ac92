//! Shared wire objects and HTTP client for the Open Wallet Monitor
//! risk-analysis API.
//!
//! The types in [`objects`] define the JSON contract with the remote
//! risk-analysis service. The [`client`] module (gated behind the `client`
//! cargo feature) provides a typed `reqwest` client over that contract, so
//! downstream crates that only need the shared types do not pull in an HTTP
//! stack.

pub mod objects;

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub use client::{ClientError, RiskApiClient};
