//! SIC Vector Store - index lifecycle, status and search gateway.
//!
//! This crate builds a similarity-search index over the UK SIC reference data
//! in the background and serves queries once it is ready. It has no HTTP
//! layer; see the `sic-store-server` crate for that.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sic_vector_store::{
//!     HashIndexBuilder, IndexConfig, LifecycleCoordinator, SearchGateway, SearchQuery,
//!     StatusRegistry,
//! };
//!
//! let registry = Arc::new(StatusRegistry::new());
//! let coordinator = LifecycleCoordinator::new(Arc::new(HashIndexBuilder::new()), registry);
//! coordinator.start(IndexConfig::from_env()?);
//!
//! let gateway = SearchGateway::new(coordinator.clone());
//! coordinator.await_ready(None).await?;
//! let results = gateway.search(&SearchQuery::new("school teacher", "teach maths", ""))?;
//! ```

pub mod config;
pub mod embed;
pub mod error;
pub mod gateway;
pub mod index;
pub mod lifecycle;
pub mod status;

pub use config::{IndexConfig, ServerConfig, StoreConfig};
pub use embed::HashIndexBuilder;
pub use error::{BuildError, IndexError, NotReady, Result, SearchError, StoreError};
pub use gateway::{SearchGateway, SearchQuery};
pub use index::{
    BuiltIndex, EmbedConfig, IndexBuilder, IndexHandle, SearchIndex, SearchResultItem,
};
pub use lifecycle::LifecycleCoordinator;
pub use status::{LifecycleState, StatusRegistry, StatusSnapshot};
