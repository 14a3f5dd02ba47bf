//! TLS certificate scan engine.
//!
//! One scan walks a domain list concurrently: the [`fetcher`] retrieves the
//! certificate chain each server presents (trust deliberately not judged at
//! this stage), the [`classifier`] derives a health status from
//! days-until-expiry plus a separate chain-validation pass, and the
//! [`scan::ScanOrchestrator`] joins everything into one immutable
//! [`certwatch_common::types::ScanReport`].

pub mod classifier;
pub mod error;
pub mod fetcher;
pub mod scan;

#[cfg(test)]
mod tests;

pub use error::{FetchError, ScanError};
pub use fetcher::{CertificateFetcher, FetchedCertificate, TlsFetcher};
pub use scan::ScanOrchestrator;
