use std::collections::HashSet;
use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use appointment_cell::{Appointment, AppointmentBookingService, AppointmentError, AppointmentStatus};

use crate::error::NotificationError;
use crate::models::{AcknowledgedSet, NotificationEvent, PollUpdate};
use crate::services::acknowledged::AcknowledgedStore;
use crate::services::dedup::diff;
use crate::services::recipient::{canonical_recipient, validate_recipient};

type FetchResult = Result<Vec<NotificationEvent>, NotificationError>;

/// Shortest tick period a poller accepts.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Where a poller reads a recipient's appointments from.
#[async_trait]
pub trait AppointmentFeed: Send + Sync {
    async fn appointments_for(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError>;
}

#[async_trait]
impl AppointmentFeed for AppointmentBookingService {
    async fn appointments_for(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.list_by_recipient(recipient).await
    }
}

/// Periodic fetch-and-diff of a recipient's appointments.
///
/// A started poller ticks at a fixed interval. Each tick fetches in a
/// separate task; a tick that comes due while that fetch is still running is
/// skipped rather than queued. Failed fetches are logged and the next tick
/// runs as usual. Polling never acknowledges anything; that only happens
/// through [`NotificationPoller::mark_read`] and
/// [`NotificationPoller::mark_all_read`].
///
/// Acknowledgements are kept per patient: a recipient given as an e-mail is
/// resolved to the patient id on its appointments first.
#[derive(Clone)]
pub struct NotificationPoller {
    feed: Arc<dyn AppointmentFeed>,
    acknowledged: Arc<dyn AcknowledgedStore>,
    interval: Duration,
}

impl NotificationPoller {
    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn new(feed: Arc<dyn AppointmentFeed>, acknowledged: Arc<dyn AcknowledgedStore>, interval: Duration) -> Self {
        if interval < MIN_POLL_INTERVAL {
            warn!("Poll interval {:?} too short, using {:?}", interval, MIN_POLL_INTERVAL);
        }
        Self {
            feed,
            acknowledged,
            interval: interval.max(MIN_POLL_INTERVAL),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// A single unscheduled fetch-and-diff.
    pub async fn poll_once(&self, recipient: &str) -> FetchResult {
        let recipient = validate_recipient(recipient)?;
        fetch_unread(Arc::clone(&self.feed), Arc::clone(&self.acknowledged), recipient).await
    }

    /// The patient key `recipient` is stored under.
    pub async fn resolve_recipient(&self, recipient: &str) -> Result<String, NotificationError> {
        let recipient = validate_recipient(recipient)?;
        let appointments = self.feed.appointments_for(&recipient).await?;
        Ok(canonical_recipient(&recipient, &appointments))
    }

    #[instrument(skip(self, appointment_ids))]
    pub async fn mark_read(
        &self,
        recipient: &str,
        appointment_ids: &[Uuid],
    ) -> Result<AcknowledgedSet, NotificationError> {
        let key = self.resolve_recipient(recipient).await?;
        let set = self.acknowledged.acknowledge_all(&key, appointment_ids).await?;
        info!("Acknowledged {} notification(s)", appointment_ids.len());
        Ok(set)
    }

    /// Acknowledges every appointment of the recipient that has left
    /// `pending`, including ones beyond the display cap.
    #[instrument(skip(self))]
    pub async fn mark_all_read(&self, recipient: &str) -> Result<AcknowledgedSet, NotificationError> {
        let recipient = validate_recipient(recipient)?;
        let appointments = self.feed.appointments_for(&recipient).await?;
        let ids: Vec<Uuid> = appointments
            .iter()
            .filter(|appointment| !appointment.is_pending())
            .map(|appointment| appointment.id)
            .collect();

        let key = canonical_recipient(&recipient, &appointments);
        let set = self.acknowledged.acknowledge_all(&key, &ids).await?;
        info!("Acknowledged all {} notification(s)", ids.len());
        Ok(set)
    }

    /// Spawns the polling loop for `recipient`. The first tick runs right away.
    pub fn start(&self, recipient: &str) -> Result<PollerHandle, NotificationError> {
        let recipient = validate_recipient(recipient)?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let (updates_tx, updates_rx) = watch::channel(None);

        let task = tokio::spawn(run(self.clone(), recipient.clone(), stop_rx, updates_tx));
        info!("Started notification poller every {:?}", self.interval);

        Ok(PollerHandle {
            recipient,
            stop: stop_tx,
            updates: updates_rx,
            task,
        })
    }
}

/// Owner of a running poller. Dropping the handle also ends the loop.
#[derive(Debug)]
pub struct PollerHandle {
    recipient: String,
    stop: watch::Sender<bool>,
    updates: watch::Receiver<Option<PollUpdate>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub fn recipient(&self) -> &str {
        &self.recipient
    }

    /// Receiver that sees every published update; `None` until the first
    /// tick completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<PollUpdate>> {
        self.updates.clone()
    }

    pub fn latest(&self) -> Option<PollUpdate> {
        self.updates.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Ends the loop and waits for it. Nothing is published once this returns;
    /// a fetch still in flight finishes on its own and its result is dropped.
    pub async fn stop(self) {
        self.stop.send_replace(true);
        if let Err(e) = self.task.await {
            error!("Notification poller task failed: {}", e);
        }
        debug!("Notification poller stopped");
    }
}

async fn fetch_unread(
    feed: Arc<dyn AppointmentFeed>,
    acknowledged: Arc<dyn AcknowledgedStore>,
    recipient: String,
) -> FetchResult {
    let appointments = feed.appointments_for(&recipient).await?;
    // Loaded after the fetch so acknowledgements made meanwhile are honoured.
    let acknowledged = acknowledged.load(&canonical_recipient(&recipient, &appointments)).await?;
    Ok(diff(&appointments, &acknowledged))
}

#[instrument(skip_all, fields(recipient = %recipient))]
async fn run(
    poller: NotificationPoller,
    recipient: String,
    mut stop: watch::Receiver<bool>,
    updates: watch::Sender<Option<PollUpdate>>,
) {
    let mut ticker = interval(poller.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut in_flight: Option<JoinHandle<FetchResult>> = None;
    let mut surfaced: HashSet<(Uuid, AppointmentStatus)> = HashSet::new();

    loop {
        tokio::select! {
            biased;

            // A dropped handle counts as a stop too.
            _ = stop.changed() => break,

            joined = async {
                match in_flight.as_mut() {
                    Some(fetch) => fetch.await,
                    None => pending().await,
                }
            }, if in_flight.is_some() => {
                in_flight = None;
                match joined {
                    Ok(Ok(unread)) => {
                        let update = surface(&recipient, unread, &mut surfaced);
                        debug!("Poll found {} unread, {} fresh", update.unread.len(), update.fresh.len());
                        updates.send_replace(Some(update));
                    }
                    Ok(Err(e)) if e.is_transient() => warn!("Poll failed, will retry next tick: {}", e),
                    Ok(Err(e)) => error!("Poll failed: {}", e),
                    Err(e) => error!("Poll task aborted: {}", e),
                }
            }

            _ = ticker.tick() => {
                if in_flight.is_some() {
                    debug!("Previous poll still running, skipping tick");
                    continue;
                }
                in_flight = Some(tokio::spawn(fetch_unread(
                    Arc::clone(&poller.feed),
                    Arc::clone(&poller.acknowledged),
                    recipient.clone(),
                )));
            }
        }
    }

    if in_flight.is_some() {
        debug!("Discarding the result of the poll in flight at stop");
    }
}

fn surface(
    recipient: &str,
    unread: Vec<NotificationEvent>,
    surfaced: &mut HashSet<(Uuid, AppointmentStatus)>,
) -> PollUpdate {
    let fresh = unread
        .iter()
        .filter(|event| surfaced.insert((event.appointment_id, event.status)))
        .cloned()
        .collect();

    PollUpdate {
        recipient: recipient.to_string(),
        unread,
        fresh,
        polled_at: Utc::now(),
    }
}
