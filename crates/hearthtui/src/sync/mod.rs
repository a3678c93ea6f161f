//! Entity synchronization core.
//!
//! [`Synchronizer`] owns the snapshot of hub entities. It loads, refreshes
//! (on demand or on a timer) and toggles entities, reporting results as
//! [`Notice`]s instead of returning errors to the UI.

mod notice;
mod snapshot;
mod synchronizer;

pub use notice::Notice;
pub use notice::NoticeReceiver;
pub use notice::NoticeSender;
pub use notice::Severity;
pub use snapshot::Snapshot;
pub use synchronizer::is_toggleable;
pub use synchronizer::Operation;
pub use synchronizer::Outcome;
pub use synchronizer::SyncError;
pub use synchronizer::Synchronizer;
pub use synchronizer::DEFAULT_REFRESH_INTERVAL;
pub use synchronizer::DEFAULT_SETTLE_DELAY;
pub use synchronizer::TOGGLEABLE_DOMAINS;
