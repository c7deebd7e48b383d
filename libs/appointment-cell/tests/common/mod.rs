#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use appointment_cell::models::{Appointment, BookAppointmentRequest, Gender, PatientDetails};
use appointment_cell::{AppointmentBookingService, InMemoryAppointmentStore};
use doctor_cell::{Doctor, InMemoryDirectory};
use shared_models::auth::Actor;
use shared_utils::clock::FixedClock;

pub const CARDIO_FIRST: Uuid = Uuid::from_u128(0xC001);
pub const CARDIO_SECOND: Uuid = Uuid::from_u128(0xC002);
pub const NEURO_FIRST: Uuid = Uuid::from_u128(0xE001);
pub const NEURO_SECOND: Uuid = Uuid::from_u128(0xE002);
pub const PEDIATRICS_ONLY: Uuid = Uuid::from_u128(0xD001);

pub const PATIENT_ID: &str = "patient-001";
pub const PATIENT_EMAIL: &str = "ana.silva@example.org";

pub struct TestContext {
    pub service: Arc<AppointmentBookingService>,
    pub store: Arc<InMemoryAppointmentStore>,
    pub directory: Arc<InMemoryDirectory>,
    pub clock: Arc<FixedClock>,
    pub today: NaiveDate,
}

impl TestContext {
    pub fn days_ahead(&self, days: i64) -> String {
        (self.today + Duration::days(days)).format("%Y-%m-%d").to_string()
    }

    pub async fn book_pending(&self) -> Appointment {
        self.service
            .book_appointment(booking_request(&self.days_ahead(3)), &patient())
            .await
            .expect("booking should succeed")
    }
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

pub fn test_directory() -> InMemoryDirectory {
    InMemoryDirectory::with_doctors(vec![
        Doctor::new(CARDIO_FIRST, "Dr. Amara Okafor", "Cardiology"),
        Doctor::new(CARDIO_SECOND, "Dr. Lucas Brandt", "Cardiology"),
        Doctor::new(NEURO_FIRST, "Dr. Mei Tanaka", "Neurology"),
        Doctor::new(NEURO_SECOND, "Dr. Rafael Ortiz", "Neurology"),
        Doctor::new(PEDIATRICS_ONLY, "Dr. Ingrid Solberg", "Pediatrics"),
    ])
}

pub fn test_context() -> TestContext {
    let store = Arc::new(InMemoryAppointmentStore::new());
    let directory = Arc::new(test_directory());
    let clock = Arc::new(FixedClock::on(today()));

    let service = Arc::new(AppointmentBookingService::new(
        store.clone(),
        directory.clone(),
        clock.clone(),
    ));

    TestContext {
        service,
        store,
        directory,
        clock,
        today: today(),
    }
}

pub fn patient_details() -> PatientDetails {
    PatientDetails {
        patient_id: Some(PATIENT_ID.to_string()),
        name: Some("Ana Silva".to_string()),
        email: Some(PATIENT_EMAIL.to_string()),
        phone: Some("+351 912 345 678".to_string()),
        gender: Some(Gender::Female),
    }
}

pub fn booking_request(date: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient: Some(patient_details()),
        department: Some("Cardiology".to_string()),
        doctor_id: Some(CARDIO_FIRST),
        date: Some(date.to_string()),
        time: Some("10:30".to_string()),
        notes: Some("Chest discomfort after exercise".to_string()),
    }
}

pub fn patient() -> Actor {
    Actor::new("patient-token")
}

pub fn staff() -> Actor {
    Actor::new("staff-token")
}
