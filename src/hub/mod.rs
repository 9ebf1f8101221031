//! External collaborators: the hub service-call sink, the order/parent
//! store, and the asynchronous push feed, all behind a background worker
//! so gesture handlers never block.

pub mod client;

pub use client::{DemoConfig, HubClient, HubCommand, HubEvent};
