//! # sensorweb-harvest
//!
//! Harvests sensor observation services into a per-pass entity graph and
//! synchronizes that graph into a persisted DCAT catalog.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────┐   ┌──────────────┐
//! │ SosClient  │──▶│  Connector   │──▶│ Constellation │──▶│ CatalogStore │
//! │ (decoded)  │   │ sos2/sos1/…  │   │  (per pass)   │   │ graph+SQLite │
//! └────────────┘   └──────┬───────┘   └───────────────┘   └──────────────┘
//!                         │
//!                         ▼
//!                 ┌─────────────────┐
//!                 │ ValueRepository │  first / last / ranged values
//!                 └─────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! swh init                 # create database
//! swh sources              # list configured sources
//! swh harvest all          # harvest every enabled source
//! swh catalog              # print the catalog graph
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Decoded service documents |
//! | [`client`] | Protocol client seam |
//! | [`client_snapshot`] | Snapshot-replaying client |
//! | [`constellation`] | Per-pass entity graph |
//! | [`connector`] | Connector trait, registry, cancellation |
//! | [`connector_sos`] | SOS 2.0, SOS 2.0 profile and SOS 1.0 connectors |
//! | [`harvest`] | Harvest orchestration |
//! | [`graph`] | Indexed triple graph with mark-and-sweep |
//! | [`vocab`] | Vocabulary IRIs |
//! | [`dcat`] | DCAT description of a service |
//! | [`extent`] | Union of observed areas |
//! | [`catalog`] | Lock-guarded catalog graph store |
//! | [`persistence`] | Persistence seam and in-memory backend |
//! | [`sqlite_persistence`] | SQLite backend |
//! | [`values`] | Value repository bridge |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |

pub mod catalog;
pub mod client;
pub mod client_snapshot;
pub mod config;
pub mod connector;
pub mod connector_sos;
pub mod constellation;
pub mod db;
pub mod dcat;
pub mod error;
pub mod extent;
pub mod graph;
pub mod harvest;
pub mod migrate;
pub mod models;
pub mod persistence;
pub mod progress;
pub mod sources;
pub mod sqlite_persistence;
pub mod values;
pub mod vocab;
