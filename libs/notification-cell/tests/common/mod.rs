#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use tokio::sync::Semaphore;
use uuid::Uuid;

use appointment_cell::{
    Appointment, AppointmentBookingService, AppointmentError, AppointmentStatus, InMemoryAppointmentStore,
    PatientSnapshot,
};
use doctor_cell::{Doctor, InMemoryDirectory};
use notification_cell::{AppointmentFeed, InMemoryAcknowledgedStore, NotificationPoller};
use shared_utils::clock::FixedClock;

pub const RECIPIENT: &str = "patient-042";
pub const CARDIOLOGIST: Uuid = Uuid::from_u128(0xC0DE);

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

/// A stored appointment for `RECIPIENT`, `days` after `today()`.
pub fn appointment(id: u128, status: AppointmentStatus, days: i64) -> Appointment {
    let stamp = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
    Appointment {
        id: Uuid::from_u128(id),
        patient: PatientSnapshot {
            patient_id: RECIPIENT.to_string(),
            name: "Jonas Weber".to_string(),
            email: "jonas.weber@example.org".to_string(),
            phone: None,
            gender: None,
        },
        department: "Cardiology".to_string(),
        doctor_id: CARDIOLOGIST,
        date: today() + chrono::Duration::days(days),
        time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        status,
        notes: None,
        created_at: stamp,
        updated_at: stamp,
    }
}

/// Feed double: serves a fixed list, can fail a number of times first, and
/// can hold every call until the test releases it.
pub struct ScriptedFeed {
    appointments: Mutex<Vec<Appointment>>,
    failures_left: AtomicUsize,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl ScriptedFeed {
    pub fn new(appointments: Vec<Appointment>) -> Self {
        Self {
            appointments: Mutex::new(appointments),
            failures_left: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn failing(self, times: usize) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn replace(&self, appointments: Vec<Appointment>) {
        *self.appointments.lock().unwrap() = appointments;
    }
}

#[async_trait]
impl AppointmentFeed for ScriptedFeed {
    async fn appointments_for(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        let remaining = self.failures_left.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_left.store(remaining - 1, Ordering::SeqCst);
            return Err(AppointmentError::TransientIo("store unreachable".to_string()));
        }

        Ok(self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|appointment| appointment.belongs_to(recipient))
            .cloned()
            .collect())
    }
}

pub struct PollerFixture {
    pub feed: Arc<ScriptedFeed>,
    pub acknowledged: Arc<InMemoryAcknowledgedStore>,
    pub poller: NotificationPoller,
}

pub fn poller_with(feed: ScriptedFeed, interval: Duration) -> PollerFixture {
    let feed = Arc::new(feed);
    let acknowledged = Arc::new(InMemoryAcknowledgedStore::new());
    let poller = NotificationPoller::new(feed.clone(), acknowledged.clone(), interval);
    PollerFixture {
        feed,
        acknowledged,
        poller,
    }
}

/// A real lifecycle manager over in-memory storage.
pub fn booking_service() -> Arc<AppointmentBookingService> {
    let directory = InMemoryDirectory::with_doctors(vec![Doctor::new(CARDIOLOGIST, "Dr. Elif Kaya", "Cardiology")]);
    Arc::new(AppointmentBookingService::new(
        Arc::new(InMemoryAppointmentStore::new()),
        Arc::new(directory),
        Arc::new(FixedClock::on(today())),
    ))
}
