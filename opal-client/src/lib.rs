//! # Opal Client
//!
//! Typed endpoints for OpenSearch-compatible servers.
//!
//! A [`Client`] wraps a [`Transport`](opal_core::Transport). Root endpoints
//! (search, bulk, info, ...) are methods on the client itself; the rest are
//! grouped into sub-clients:
//!
//! | Sub-client | Endpoints |
//! |---|---|
//! | [`Client::documents`] | create, index, get, exists, source, update, delete |
//! | [`Client::indices`] | index lifecycle, aliases, mappings, settings |
//! | [`Client::cluster`] | health, state, stats, settings |
//! | [`Client::snapshot`] | repositories, snapshots, restore, clone, status |
//! | [`Client::tasks`] | list, get, cancel |
//! | [`Client::templates`] | composable index templates |
//! | [`Client::point_in_time`] | create, list, delete |
//! | [`Client::tiers`] | warm, ultrawarm and cold migration |
//!
//! Every method takes a [`Context`](opal_core::Context) and a request
//! descriptor, and returns the decoded body together with the raw
//! [`Response`](opal_core::Response). `exists` methods return the bare
//! response: 200 when the resource exists, 404 when it does not.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use opal_client::Client;
//! use opal_client::indices::IndicesCreateReq;
//! use opal_core::{Body, Context};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::from_url("http://localhost:9200")?;
//! let ctx = Context::background();
//!
//! let created = client
//!     .indices()
//!     .create(
//!         &ctx,
//!         IndicesCreateReq {
//!             index: "movies".into(),
//!             body: Some(Body::json(&json!({"settings": {"number_of_shards": 1}}))?),
//!             ..Default::default()
//!         },
//!     )
//!     .await?;
//! assert!(created.acknowledged);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod bulk;
pub mod by_query;
pub mod client;
pub mod cluster;
pub mod common;
pub mod document;
mod endpoint;
pub mod indices;
pub mod info;
pub mod mapping;
pub mod params;
pub mod pit;
pub mod search;
pub mod settings;
pub mod snapshot;
pub mod tasks;
pub mod templates;
pub mod tiers;

pub use client::{Client, ClientConfig};
pub use cluster::Cluster;
pub use common::{AcknowledgedResp, ByQueryResp, ShardsAcknowledgedResp, ShardsInfo};
pub use document::Document;
pub use indices::Indices;
pub use pit::PointInTime;
pub use snapshot::Snapshot;
pub use tasks::Tasks;
pub use templates::Templates;
pub use tiers::Tiers;

pub use opal_core;
