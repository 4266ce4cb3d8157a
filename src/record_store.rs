use crate::config::Config;
use crate::errors::{AppError, RecordStoreError};
use crate::models::{LeadId, LeadRecord, NewLead};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Result of looking up a remembered identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    Found(String),
    NotFound,
}

/// Remote lead table: insert, get-by-id, partial update-by-id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Inserts a lead and returns the store-assigned identifier.
    async fn create(&self, lead: &NewLead) -> Result<String, RecordStoreError>;

    /// Distinguishes "no such lead" (`Ok(NotFound)`) from a failed request (`Err`).
    async fn verify(&self, identifier: &str) -> Result<VerifyOutcome, RecordStoreError>;

    /// Best effort. Callers are free to discard the result.
    async fn mark_downloaded(&self, identifier: &str) -> Result<(), RecordStoreError>;
}

/// Client for the hosted lead table exposed through PostgREST (Supabase).
#[derive(Clone)]
pub struct SupabaseRecordStore {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    table: String,
}

impl SupabaseRecordStore {
    /// Creates a new `SupabaseRecordStore`.
    ///
    /// # Arguments
    ///
    /// * `config` - Supplies the project URL, anon key, table and timeout.
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| {
                AppError::ExternalApiError(format!("Failed to create record store client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            api_key: config.supabase_anon_key.clone(),
            table: config.leads_table.clone(),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn request(&self, method: reqwest::Method) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.table_url())
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn error_text(response: reqwest::Response) -> String {
        response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string())
    }
}

#[async_trait]
impl RecordStore for SupabaseRecordStore {
    async fn create(&self, lead: &NewLead) -> Result<String, RecordStoreError> {
        tracing::info!("Creating lead in {}: {}", self.table, lead.email);

        let response = self
            .request(reqwest::Method::POST)
            .query(&[("select", "id")])
            .header("Prefer", "return=representation")
            .json(&[lead])
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            let error_text = Self::error_text(response).await;
            return Err(RecordStoreError::Rejected(format!(
                "{}: {}",
                status, error_text
            )));
        }
        if !status.is_success() {
            let error_text = Self::error_text(response).await;
            return Err(RecordStoreError::Transport(format!(
                "Lead insert returned {}: {}",
                status, error_text
            )));
        }

        let rows: Vec<LeadId> = response.json().await?;

        let lead_id = rows
            .into_iter()
            .next()
            .and_then(LeadId::into_string)
            .ok_or_else(|| {
                RecordStoreError::Transport("Insert response missing 'id' field".to_string())
            })?;

        tracing::info!("✓ Lead created successfully: {}", lead_id);
        Ok(lead_id)
    }

    async fn verify(&self, identifier: &str) -> Result<VerifyOutcome, RecordStoreError> {
        tracing::info!("Verifying lead {}", identifier);

        let response = self
            .request(reqwest::Method::GET)
            .query(&[("id", format!("eq.{}", identifier).as_str()), ("select", "id")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = Self::error_text(response).await;
            return Err(RecordStoreError::Transport(format!(
                "Lead lookup returned {}: {}",
                status, error_text
            )));
        }

        let rows: Vec<LeadId> = response.json().await?;

        match rows.into_iter().next().and_then(LeadId::into_string) {
            Some(id) => {
                tracing::info!("✓ Lead {} verified", id);
                Ok(VerifyOutcome::Found(id))
            }
            None => {
                tracing::warn!("Lead {} not found", identifier);
                Ok(VerifyOutcome::NotFound)
            }
        }
    }

    async fn mark_downloaded(&self, identifier: &str) -> Result<(), RecordStoreError> {
        tracing::info!("Marking kit downloaded for lead {}", identifier);

        let response = self
            .request(reqwest::Method::PATCH)
            .query(&[("id", format!("eq.{}", identifier).as_str())])
            .json(&json!({ "downloaded_kit": true }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = Self::error_text(response).await;
            return Err(RecordStoreError::Transport(format!(
                "Lead update returned {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }
}

/// In-process table. Identifiers are sequential (`lead-1`, `lead-2`, ...).
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    inner: Arc<Mutex<MemoryTable>>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    next_id: u64,
    rows: HashMap<String, LeadRecord>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<LeadRecord> {
        self.table().rows.get(identifier).cloned()
    }

    pub fn len(&self) -> usize {
        self.table().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> std::sync::MutexGuard<'_, MemoryTable> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn create(&self, lead: &NewLead) -> Result<String, RecordStoreError> {
        if !lead.consent {
            return Err(RecordStoreError::Rejected(
                "consent must be granted".to_string(),
            ));
        }
        let mut table = self.table();
        table.next_id += 1;
        let id = format!("lead-{}", table.next_id);
        table
            .rows
            .insert(id.clone(), LeadRecord::from_new(id.clone(), lead.clone()));
        Ok(id)
    }

    async fn verify(&self, identifier: &str) -> Result<VerifyOutcome, RecordStoreError> {
        Ok(match self.table().rows.get(identifier) {
            Some(row) => VerifyOutcome::Found(row.id.clone()),
            None => VerifyOutcome::NotFound,
        })
    }

    async fn mark_downloaded(&self, identifier: &str) -> Result<(), RecordStoreError> {
        // PostgREST reports success for a PATCH matching no rows
        if let Some(row) = self.table().rows.get_mut(identifier) {
            row.downloaded_kit = Some(true);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeBracket, Interest, Sex, Situation};

    fn lead(consent: bool) -> NewLead {
        NewLead {
            name: "Marta".to_string(),
            email: "marta@example.com".to_string(),
            phone: "+525512345678".to_string(),
            country: "México".to_string(),
            age: Some(AgeBracket::From46To55),
            sex: Some(Sex::Woman),
            situation: Some(Situation::Caregiver),
            interest: Some(Interest::InterestedWithQuestions),
            consent,
            utm_source: None,
            utm_medium: None,
            utm_campaign: None,
        }
    }

    #[test]
    fn test_client_creation() {
        let store = SupabaseRecordStore::new(&Config::for_store("https://example.supabase.co/"));
        assert!(store.is_ok());
        assert_eq!(
            store.unwrap().table_url(),
            "https://example.supabase.co/rest/v1/leads_escuela_cuidarte"
        );
    }

    #[tokio::test]
    async fn test_memory_store_lifecycle() {
        let store = MemoryRecordStore::new();
        let id = store.create(&lead(true)).await.unwrap();
        assert_eq!(id, "lead-1");

        assert_eq!(
            store.verify(&id).await.unwrap(),
            VerifyOutcome::Found(id.clone())
        );
        assert_eq!(
            store.verify("missing").await.unwrap(),
            VerifyOutcome::NotFound
        );

        store.mark_downloaded(&id).await.unwrap();
        assert_eq!(store.get(&id).unwrap().downloaded_kit, Some(true));
    }

    #[tokio::test]
    async fn test_memory_store_requires_consent() {
        let store = MemoryRecordStore::new();
        let result = store.create(&lead(false)).await;
        assert!(matches!(result, Err(RecordStoreError::Rejected(_))));
        assert!(store.is_empty());
    }
}
