//! Document-store access for chat messages, stream sessions and video clips,
//! with viewer and message-rate analytics over a stream or clip window.
//!
//! ```no_run
//! use streamdb::{DbClient, DbConfig, ReferenceSelector};
//!
//! # async fn run() -> streamdb::Result<()> {
//! let client = DbClient::connect(&DbConfig::from_env()?)?;
//! let rate = client
//!     .message_rate_over_time("teststreamer", ReferenceSelector::Latest)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod client;
pub mod config;
pub mod db;
pub mod duration;
pub mod error;
pub mod utils;

pub use analytics::{MessageRateSample, ReferenceSelector, ReferenceWindow, ViewerSample};
pub use client::DbClient;
pub use config::{DbConfig, StoreLocation};
pub use db::{
    models::{Clip, ClipFilter, ClipUpdate, DurationInput, Message, Stored, Stream},
    store::{Collection, Document, DocumentId, DocumentStore, FieldPath, Filter, Sort, Update},
    Database,
};
pub use duration::duration_to_secs;
pub use error::{DbError, Result};
pub use utils::logging::init_logging;
