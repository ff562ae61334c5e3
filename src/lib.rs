//! Valorem - Multi-provider AVM aggregation and analysis.
//!
//! This crate aggregates automated-valuation-model estimates for a property
//! from several independent, unreliable external sources and reconciles
//! them into a single confidence-scored result.
//!
//! # Architecture
//!
//! One analysis run flows strictly forward:
//!
//! - **`provider`** - The [`AvmProvider`](provider::AvmProvider) capability
//!   trait plus the machinery each source is driven through: bounded
//!   retries with linear backoff, a global concurrency gate, and a windowed
//!   rate limiter.
//! - **`app`** - The [`ScrapeOrchestrator`](app::ScrapeOrchestrator) fans a
//!   run out to every configured source and joins on all of them; the
//!   [`AnalysisService`](app::AnalysisService) assembles the final result.
//! - **`domain`** - Address identity, estimate types, and the
//!   [`Reconciler`](domain::Reconciler): mean/range statistics with a
//!   coefficient-of-variation confidence discount, plus deal underwriting
//!   metrics in [`domain::investment`].
//! - **`store`** - Persistence as an external collaborator: the
//!   [`PropertyStore`](store::PropertyStore) trait and an in-memory
//!   reference backend.
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files with env overrides
//! - [`domain`] - Provider-agnostic types and reconciliation statistics
//! - [`error`] - Error types for the crate
//! - [`provider`] - Source capability trait, retry/limiter machinery, and
//!   the dataset-API adapter
//! - [`store`] - Persistence traits and the in-memory backend
//! - [`app`] - Orchestration and the analysis service
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use valorem::app::build_service;
//! use valorem::config::Config;
//! use valorem::domain::NormalizedAddress;
//! use valorem::store::MemoryStore;
//!
//! # async fn run() -> valorem::error::Result<()> {
//! let config = Config::default();
//! let store = Arc::new(MemoryStore::new());
//! let service = build_service(&config, vec![], store);
//!
//! let address = NormalizedAddress::new("1841 Marks Ave", "Akron", "OH", "44305");
//! let analysis = service.analyze_property(&address).await?;
//! println!("{} -> {}", address, analysis.average_estimate);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod provider;
pub mod store;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
