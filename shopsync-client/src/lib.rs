//! # shopsync-client
//!
//! HTTP plumbing for the reconciliation job: a retrying GraphQL transport,
//! the Shopify Admin API client ([`ShopifyClient`]), and the local feed
//! client ([`FeedClient`]).
//!
//! The [`ProductApi`] and [`LocalFeed`] traits are the seams the reconciler
//! works against; tests substitute in-memory implementations.

pub mod error;
pub mod feed;
pub mod http;
pub mod shopify;

pub use error::ClientError;
pub use feed::{FeedClient, LocalFeed};
pub use http::{GraphqlTransport, HttpTransport, RetryPolicy};
pub use shopify::{ProductApi, ShopifyClient};
