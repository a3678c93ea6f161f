//! Home Assistant REST API client.
//!
//! Every request carries the bearer token and runs inside a [`Session`]; the
//! [`Hub`] trait exists so the synchronization core can be driven by a mock.

mod client;
mod entity;
mod error;
mod info;
#[cfg(test)]
pub(crate) mod mock;

pub use client::Hub;
pub use client::HubClient;
pub use client::Session;
pub use client::DEFAULT_TIMEOUT;
pub use entity::entity_domain;
pub use entity::service_domain;
pub use entity::Entity;
pub use error::HubError;
pub use info::HubInfo;
