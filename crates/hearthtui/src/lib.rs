pub mod config;
pub mod hub;
pub mod sync;
pub mod ui;

pub use config::Config;
pub use config::ConfigError;
pub use config::Credentials;
pub use config::LogLevel;
pub use hub::Entity;
pub use hub::Hub;
pub use hub::HubClient;
pub use hub::HubError;
pub use hub::HubInfo;
pub use hub::Session;
pub use sync::Notice;
pub use sync::Outcome;
pub use sync::Severity;
pub use sync::Snapshot;
pub use sync::SyncError;
pub use sync::Synchronizer;
