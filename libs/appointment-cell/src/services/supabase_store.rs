// libs/appointment-cell/src/services/supabase_store.rs
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{Appointment, AppointmentError, AppointmentStatus};
use crate::services::store::AppointmentStore;

const TABLE: &str = "/rest/v1/appointments";

/// Appointment rows in the hosted `appointments` table. The patient snapshot
/// is kept in a `jsonb` column so it stays a value copy.
pub struct SupabaseAppointmentStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseAppointmentStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn fetch(&self, query: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let path = format!("{}?{}", TABLE, query);
        self.supabase
            .request::<Vec<Appointment>>(Method::GET, &path, None, None)
            .await
            .map_err(transient)
    }
}

fn transient(error: anyhow::Error) -> AppointmentError {
    error!("Appointment store request failed: {}", error);
    AppointmentError::TransientIo(error.to_string())
}

/// `or=(..)` body matching a patient id exactly or an e-mail case-insensitively.
/// Both values are double-quoted so `,` `(` `)` stay literal, and LIKE
/// wildcards in the e-mail are escaped.
fn recipient_filter(recipient: &str) -> String {
    let recipient = recipient.trim();
    let filter = format!(
        "patient->>patient_id.eq.{},patient->>email.ilike.{}",
        quote(recipient),
        quote(&like_literal(recipient))
    );
    urlencoding::encode(&filter).into_owned()
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn like_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn to_row(appointment: &Appointment) -> Result<Value, AppointmentError> {
    serde_json::to_value(appointment)
        .map_err(|e| AppointmentError::TransientIo(format!("failed to encode appointment: {}", e)))
}

#[async_trait]
impl AppointmentStore for SupabaseAppointmentStore {
    async fn insert(&self, appointment: Appointment) -> Result<Appointment, AppointmentError> {
        let rows: Vec<Appointment> = self
            .supabase
            .request_with_representation(Method::POST, TABLE, None, Some(to_row(&appointment)?))
            .await
            .map_err(transient)?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppointmentError::TransientIo("insert returned no rows".to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Appointment>, AppointmentError> {
        Ok(self.fetch(&format!("id=eq.{}", id)).await?.into_iter().next())
    }

    async fn update_if_status(
        &self,
        appointment: Appointment,
        expected_status: AppointmentStatus,
    ) -> Result<Option<Appointment>, AppointmentError> {
        let path = format!("{}?id=eq.{}&status=eq.{}", TABLE, appointment.id, expected_status);
        debug!("Conditional update of appointment {} (expecting {})", appointment.id, expected_status);

        let rows: Vec<Appointment> = self
            .supabase
            .request_with_representation(Method::PATCH, &path, None, Some(to_row(&appointment)?))
            .await
            .map_err(transient)?;

        Ok(rows.into_iter().next())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppointmentError> {
        let path = format!("{}?id=eq.{}", TABLE, id);
        let rows: Vec<Value> = self
            .supabase
            .request_with_representation(Method::DELETE, &path, None, None)
            .await
            .map_err(transient)?;

        Ok(!rows.is_empty())
    }

    async fn list_by_recipient(&self, recipient: &str) -> Result<Vec<Appointment>, AppointmentError> {
        let query = format!("or=({})&order=date.desc,time.desc", recipient_filter(recipient));
        self.fetch(&query).await
    }

    async fn list_by_status(&self, status: AppointmentStatus) -> Result<Vec<Appointment>, AppointmentError> {
        self.fetch(&format!("status=eq.{}", status)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(recipient: &str) -> String {
        urlencoding::decode(&recipient_filter(recipient)).unwrap().into_owned()
    }

    #[test]
    fn recipient_values_are_quoted() {
        assert_eq!(
            decoded(" patient-042 "),
            r#"patient->>patient_id.eq."patient-042",patient->>email.ilike."patient-042""#
        );
        assert_eq!(
            decoded("a,b)@x.org"),
            r#"patient->>patient_id.eq."a,b)@x.org",patient->>email.ilike."a,b)@x.org""#
        );
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(
            decoded("jo_n%@x.org"),
            r#"patient->>patient_id.eq."jo_n%@x.org",patient->>email.ilike."jo\\_n\\%@x.org""#
        );
        assert_eq!(quote(r#"a"b"#), r#""a\"b""#);
    }
}
