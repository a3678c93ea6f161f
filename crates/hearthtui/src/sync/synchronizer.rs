use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use arc_swap::ArcSwapOption;
use strum::Display;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::notice::Notice;
use super::notice::NoticeSender;
use super::notice::Severity;
use super::snapshot::Snapshot;
use crate::hub::Entity;
use crate::hub::Hub;
use crate::hub::HubError;
use crate::hub::HubInfo;
use crate::hub::Session;

/// Domains whose entities respond to the `toggle` service
pub const TOGGLEABLE_DOMAINS: [&str; 5] = ["light", "switch", "fan", "cover", "lock"];

/// Time given to the hub to propagate a state change before re-reading it
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Lower bound for the auto-refresh period
const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(1);

pub fn is_toggleable(domain: &str) -> bool {
    TOGGLEABLE_DOMAINS.contains(&domain)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Operation {
    Load,
    Refresh,
    Toggle,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Failed to connect to hub")]
    ConnectionUnavailable,

    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: HubError,
    },

    #[error("Cannot toggle {domain}")]
    NotToggleable { entity_id: String, domain: String },

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),
}

fn transport(operation: Operation) -> impl FnOnce(HubError) -> SyncError {
    move |source| SyncError::Transport { operation, source }
}

/// What a top-level operation ended up doing
#[derive(Debug)]
pub enum Outcome {
    /// Initial load completed with this many entities
    Loaded(usize),
    /// Refresh completed with this many entities
    Refreshed(usize),
    /// Toggle sent; the follow-up refresh reports separately
    Toggled,
    /// Dropped because the same operation was already running
    Skipped,
    /// Nothing to do (e.g. the entity vanished from the snapshot)
    Ignored,
    /// Failed; already reported as a notice
    Failed(SyncError),
}

/// Claim on a single-flight flag, released on drop
struct Flight<'a>(&'a AtomicBool);

impl<'a> Flight<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for Flight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the local view of the hub in sync.
///
/// Owns the entity snapshot and serializes refreshes: at most one refresh and
/// one load run at a time, extra requests are dropped rather than queued.
/// Readers load the snapshot `Arc` and never see a half-applied refresh.
pub struct Synchronizer<H: Hub> {
    hub: Mutex<H>,

    /// Readers load the Arc, a completed cycle stores a new one
    snapshot: ArcSwap<Snapshot>,

    info: ArcSwapOption<HubInfo>,

    refreshing: AtomicBool,
    loading: AtomicBool,
    loaded: AtomicBool,

    settle_delay: Duration,

    notices: NoticeSender,
}

impl<H: Hub> Synchronizer<H> {
    pub fn new(hub: H, notices: NoticeSender) -> Self {
        Self {
            hub: Mutex::new(hub),
            snapshot: ArcSwap::new(Arc::default()),
            info: ArcSwapOption::empty(),
            refreshing: AtomicBool::new(false),
            loading: AtomicBool::new(false),
            loaded: AtomicBool::new(false),
            settle_delay: DEFAULT_SETTLE_DELAY,
            notices,
        }
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// The snapshot from the last completed cycle
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }

    pub fn hub_info(&self) -> Option<Arc<HubInfo>> {
        self.info.load_full()
    }

    /// Whether an initial load has completed
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    /// Probe the hub, fetch its config and the full entity list.
    pub async fn connect_and_load(&self) -> Outcome {
        let Some(_flight) = Flight::claim(&self.loading) else {
            debug!("Load already in progress, dropping request");
            return Outcome::Skipped;
        };

        match self.try_load().await {
            Ok(count) => {
                self.report(Notice::info(format!("Loaded {} entities", count)));
                Outcome::Loaded(count)
            }
            Err(e) => self.fail(e),
        }
    }

    async fn try_load(&self) -> Result<usize, SyncError> {
        let mut hub = self.hub.lock().await;
        let session = Session::open(&mut *hub).map_err(transport(Operation::Load))?;

        if !session.check_connection().await {
            return Err(SyncError::ConnectionUnavailable);
        }

        let config = session
            .get_config()
            .await
            .map_err(transport(Operation::Load))?;
        let info = HubInfo::from_config(config);
        info!(
            "Connected to {} (version {})",
            info.location_name, info.version
        );
        self.info.store(Some(Arc::new(info)));

        let entities = session
            .get_states()
            .await
            .map_err(transport(Operation::Load))?;
        drop(session);

        let count = self.replace_snapshot(entities);
        self.loaded.store(true, Ordering::Release);
        Ok(count)
    }

    /// Re-read the full entity list, unless a refresh is already running.
    pub async fn refresh(&self) -> Outcome {
        let Some(_flight) = Flight::claim(&self.refreshing) else {
            debug!("Refresh already in progress, dropping request");
            return Outcome::Skipped;
        };

        match self.try_refresh().await {
            Ok(count) => {
                self.report(Notice::info("Refreshed"));
                Outcome::Refreshed(count)
            }
            Err(e) => self.fail(e),
        }
    }

    async fn try_refresh(&self) -> Result<usize, SyncError> {
        let entities = {
            let mut hub = self.hub.lock().await;
            let session = Session::open(&mut *hub).map_err(transport(Operation::Refresh))?;
            session
                .get_states()
                .await
                .map_err(transport(Operation::Refresh))?
        };

        Ok(self.replace_snapshot(entities))
    }

    /// Toggle an entity, then refresh once the hub has had time to settle.
    pub async fn toggle_entity(&self, entity_id: &str) -> Outcome {
        let snapshot = self.snapshot();
        let Some(entity) = snapshot.get(entity_id) else {
            return self.fail(SyncError::UnknownEntity(entity_id.to_string()));
        };

        if !is_toggleable(entity.domain()) {
            return self.fail(SyncError::NotToggleable {
                entity_id: entity_id.to_string(),
                domain: entity.domain().to_string(),
            });
        }

        if let Err(e) = self.try_toggle(entity_id).await {
            return self.fail(e);
        }
        self.report(Notice::info(format!("Toggled {}", entity.friendly_name)));

        tokio::time::sleep(self.settle_delay).await;
        self.refresh().await;

        Outcome::Toggled
    }

    async fn try_toggle(&self, entity_id: &str) -> Result<(), SyncError> {
        let mut hub = self.hub.lock().await;
        let session = Session::open(&mut *hub).map_err(transport(Operation::Toggle))?;
        session
            .toggle(entity_id)
            .await
            .map_err(transport(Operation::Toggle))?;
        Ok(())
    }

    /// Refresh every `period` until the returned task is aborted.
    ///
    /// The first refresh happens one period from now. Ticks that land while a
    /// refresh is still running are dropped.
    pub fn start_auto_refresh(self: &Arc<Self>, period: Duration) -> JoinHandle<()>
    where
        H: 'static,
    {
        let period = period.max(MIN_REFRESH_INTERVAL);
        let sync = Arc::clone(self);

        info!("Auto-refresh every {:?}", period);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                sync.refresh().await;
            }
        })
    }

    /// Swap in a fresh snapshot built from `entities`; returns its size
    fn replace_snapshot(&self, entities: Vec<Entity>) -> usize {
        let snapshot = Snapshot::from_entities(entities);
        let count = snapshot.len();
        self.snapshot.store(Arc::new(snapshot));
        debug!("Snapshot replaced ({} entities)", count);
        count
    }

    fn fail(&self, e: SyncError) -> Outcome {
        match &e {
            SyncError::UnknownEntity(entity_id) => {
                debug!("Ignoring toggle for unknown entity {}", entity_id);
                return Outcome::Ignored;
            }
            SyncError::NotToggleable { entity_id, .. } => {
                debug!("Refusing to toggle {}", entity_id);
                self.report(Notice::warning(e.to_string()));
            }
            SyncError::ConnectionUnavailable | SyncError::Transport { .. } => {
                self.report(Notice::error(e.to_string()));
            }
        }
        Outcome::Failed(e)
    }

    fn report(&self, notice: Notice) {
        match notice.severity {
            Severity::Info => info!("{}", notice.message),
            Severity::Warning => warn!("{}", notice.message),
            Severity::Error => error!("{}", notice.message),
        }

        if self.notices.send(notice).is_err() {
            debug!("Notice receiver dropped");
        }
    }
}
