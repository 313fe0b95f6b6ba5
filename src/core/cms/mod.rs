//! CMS adapters: the public content API, the admin content-mutation API and
//! the request sequencing that keeps stale responses from overwriting fresh ones.

/// Admin content-mutation client (`/api/admin/content`)
pub mod admin;
/// Public content API client
pub mod client;
/// Content entries and query parameters
pub mod content;
/// Request sequencing and fetch state
pub mod sequence;

pub use admin::{AdminContentClient, ContentSink};
pub use client::CmsClient;
pub use content::{ContentEntry, ContentQuery, ContentResponse, SortOrder};
pub use sequence::{FetchState, LatestResult, RequestSequencer, RequestTicket};
