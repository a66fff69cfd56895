//! Typed errors for document-, configuration- and query-level failures.
//!
//! Failures of a single procedure during a harvest never surface here; the
//! connectors log and skip them. Everything below propagates to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("no connector can handle service '{source_name}' at {url}")]
    UnsupportedService { source_name: String, url: String },

    #[error("could not decode capabilities: {0}")]
    Decoding(String),

    #[error("harvest of '{0}' was cancelled")]
    Cancelled(String),

    #[error("remote request failed: {0:#}")]
    Remote(anyhow::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not parse service metadata: {0}")]
    Decoding(String),

    #[error("catalog persistence failed: {0:#}")]
    Persistence(anyhow::Error),
}

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("connector not found: '{0}'")]
    ConnectorNotFound(String),

    #[error("observation query failed: {0:#}")]
    Connector(anyhow::Error),
}
