// =============================================================================
// parcel_track_engine — ONE TRACKING NUMBER, EVERY COURIER THAT KNOWS IT
// =============================================================================
//
// Hand the engine a tracking number and it will:
//
//   registry   → which couriers recognise this number?
//   dispatcher → ask all of them at once, survive the ones that fall over
//   providers  → scrape / query each courier, hop to the last-mile courier
//   merge      → fold the answers into one record, newest event first
//   render     → text for humans, JSON for scripts
// =============================================================================

pub mod config;
pub mod dates;
pub mod dispatcher;
pub mod error;
pub mod merge;
pub mod metrics;
pub mod models;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod render;

pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{FetchError, ResolveError, ResolveResult};
pub use merge::merge_parcels;
pub use metrics::{MetricsSnapshot, ResolverMetrics};
pub use models::{ParcelEvent, ParcelInfo};
pub use provider::{FetchContext, Provider, TrackingPattern};
pub use providers::builtin_registry;
pub use registry::{domain_from_url, Registry};
