//! # Application State
//!
//! Shared state for the Axum application. The in-memory stores are the
//! runtime source of truth; when a database pool is present every
//! successful mutation is written through to Postgres, and the stores are
//! hydrated from it at startup.
//!
//! ## Lock order
//!
//! Operations that touch more than one store take locks in this order and
//! never the reverse:
//!
//! ```text
//! policies → templates → configurations
//! acknowledgements → history
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;
use uuid::Uuid;

use attest_core::{
    AttestError, AuditStatus, Clock, ComplianceType, EmployeeId, EmployeeStatus, ProgressStatus,
    SubscriptionType, SystemClock,
};
use attest_notify::{Notifier, TracingNotifier};
use attest_state::{
    Acknowledgement, EmployeeDirectory, EmployeeProfile, HistoryRecord, Policy,
    PolicyConfiguration, TemplateCatalog,
};

use crate::config::AppConfig;

// ─── Generic Store ──────────────────────────────────────────────────

/// Thread-safe in-memory keyed store.
#[derive(Debug)]
pub struct Store<T: Clone + Send + Sync> {
    data: Arc<RwLock<HashMap<Uuid, T>>>,
}

impl<T: Clone + Send + Sync> Clone for Store<T> {
    fn clone(&self) -> Self {
        Self {
            data: Arc::clone(&self.data),
        }
    }
}

impl<T: Clone + Send + Sync> Store<T> {
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert a record, returning the previous value if the key existed.
    pub fn insert(&self, id: Uuid, value: T) -> Option<T> {
        self.data.write().insert(id, value)
    }

    pub fn get(&self, id: &Uuid) -> Option<T> {
        self.data.read().get(id).cloned()
    }

    pub fn list(&self) -> Vec<T> {
        self.data.read().values().cloned().collect()
    }

    /// Records matching `keep`.
    pub fn filter(&self, keep: impl Fn(&T) -> bool) -> Vec<T> {
        self.data.read().values().filter(|v| keep(v)).cloned().collect()
    }

    /// Whether any record matches `pred`.
    pub fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.data.read().values().any(pred)
    }

    /// Atomically read-validate-update a record.
    ///
    /// The closure runs under the store's write lock. Returns `None` if the
    /// record doesn't exist.
    pub fn try_update<R, E>(
        &self,
        id: &Uuid,
        f: impl FnOnce(&mut T) -> Result<R, E>,
    ) -> Option<Result<R, E>> {
        self.data.write().get_mut(id).map(f)
    }

    /// Run `f` with exclusive access to the whole map, for checks that span
    /// records (uniqueness) followed by a write.
    pub fn write<R>(&self, f: impl FnOnce(&mut HashMap<Uuid, T>) -> R) -> R {
        f(&mut self.data.write())
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.data.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Clone + Send + Sync> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tenant Records ─────────────────────────────────────────────────

/// Tenant organization.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerRecord {
    pub id: Uuid,
    pub name: String,
    /// free, standard or premium.
    #[schema(value_type = String)]
    pub subscription_type: SubscriptionType,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Compliance domain a customer can subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ComplianceRecord {
    pub id: Uuid,
    /// infosec, acceptable_use or cryptographic.
    #[schema(value_type = String)]
    pub compliance_type: ComplianceType,
    pub compliance_title: String,
    pub description: Option<String>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A customer's progress on one compliance domain.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerComplianceRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub compliance_id: Uuid,
    /// pending, in_progress or completed.
    #[schema(value_type = String)]
    pub status: ProgressStatus,
    /// Decimal string between 0 and 100 with at most two fraction digits.
    pub compliance_percentage: String,
    pub audit_date: Option<DateTime<Utc>>,
    /// pending or completed.
    #[schema(value_type = String)]
    pub audit_status: AuditStatus,
    pub acknowledged_count: u32,
    pub pending_count: u32,
    pub compliance_updated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Employee of a customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmployeeRecord {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    /// active or inactive.
    #[schema(value_type = String)]
    pub status: EmployeeStatus,
    pub join_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl EmployeeRecord {
    pub fn profile(&self) -> EmployeeProfile {
        EmployeeProfile {
            id: EmployeeId::from_uuid(self.id),
            name: self.name.clone(),
            email: self.email.clone(),
            join_date: self.join_date,
            created_at: self.created_at,
        }
    }
}

impl EmployeeDirectory for Store<EmployeeRecord> {
    fn resolve_employee(&self, id: EmployeeId) -> Result<EmployeeProfile, AttestError> {
        self.get(id.as_uuid())
            .map(|e| e.profile())
            .ok_or_else(|| AttestError::not_found("employee", id))
    }
}

// ─── Application State ──────────────────────────────────────────────

/// Shared application state, cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub customers: Store<CustomerRecord>,
    pub compliances: Store<ComplianceRecord>,
    pub customer_compliances: Store<CustomerComplianceRecord>,
    pub employees: Store<EmployeeRecord>,
    pub templates: Arc<RwLock<TemplateCatalog>>,
    pub policies: Store<Policy>,
    pub configurations: Store<PolicyConfiguration>,
    pub acknowledgements: Store<Acknowledgement>,
    /// Append-only audit trail.
    pub history: Arc<RwLock<Vec<HistoryRecord>>>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    /// Postgres pool; `None` means in-memory only.
    pub db_pool: Option<PgPool>,
    pub config: AppConfig,
    /// Prometheus handle; `None` when metrics are disabled.
    pub metrics: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("customers", &self.customers.len())
            .field("employees", &self.employees.len())
            .field("templates", &self.templates.read().len())
            .field("policies", &self.policies.len())
            .field("acknowledgements", &self.acknowledgements.len())
            .field("history", &self.history.read().len())
            .field("db", &self.db_pool.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// In-memory state with default configuration.
    pub fn new() -> Self {
        Self::with_config(AppConfig::default(), None)
    }

    /// State with explicit configuration and optional database pool.
    /// Notifications are logged until [`AppState::with_notifier`] replaces
    /// the sender.
    pub fn with_config(config: AppConfig, db_pool: Option<PgPool>) -> Self {
        Self {
            customers: Store::new(),
            compliances: Store::new(),
            customer_compliances: Store::new(),
            employees: Store::new(),
            templates: Arc::new(RwLock::new(TemplateCatalog::new())),
            policies: Store::new(),
            configurations: Store::new(),
            acknowledgements: Store::new(),
            history: Arc::new(RwLock::new(Vec::new())),
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            db_pool,
            config,
            metrics: None,
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// History rows of one acknowledgement, oldest first.
    pub fn history_of(&self, acknowledgement: Uuid) -> Vec<HistoryRecord> {
        self.history
            .read()
            .iter()
            .filter(|h| h.acknowledgement_id.0 == acknowledgement)
            .cloned()
            .collect()
    }

    /// Load every table into the in-memory stores. No-op without a pool.
    pub async fn hydrate_from_db(&self) -> Result<(), String> {
        let pool = match &self.db_pool {
            Some(pool) => pool,
            None => return Ok(()),
        };

        let customers = crate::db::customers::load_all(pool)
            .await
            .map_err(|e| format!("failed to load customers: {e}"))?;
        let customer_count = customers.len();
        for record in customers {
            self.customers.insert(record.id, record);
        }

        let compliances = crate::db::compliances::load_all(pool)
            .await
            .map_err(|e| format!("failed to load compliances: {e}"))?;
        for record in compliances {
            self.compliances.insert(record.id, record);
        }

        let links = crate::db::customer_compliances::load_all(pool)
            .await
            .map_err(|e| format!("failed to load customer compliances: {e}"))?;
        for record in links {
            self.customer_compliances.insert(record.id, record);
        }

        let employees = crate::db::employees::load_all(pool)
            .await
            .map_err(|e| format!("failed to load employees: {e}"))?;
        let employee_count = employees.len();
        for record in employees {
            self.employees.insert(record.id, record);
        }

        let templates = crate::db::templates::load_all(pool)
            .await
            .map_err(|e| format!("failed to load templates: {e}"))?;
        let template_count = templates.len();
        {
            let mut catalog = self.templates.write();
            for (version, is_latest) in templates {
                catalog.restore(version, is_latest);
            }
        }

        let policies = crate::db::policies::load_all(pool)
            .await
            .map_err(|e| format!("failed to load policies: {e}"))?;
        let policy_count = policies.len();
        for policy in policies {
            self.policies.insert(policy.id.0, policy);
        }

        let configurations = crate::db::configurations::load_all(pool)
            .await
            .map_err(|e| format!("failed to load policy configurations: {e}"))?;
        for configuration in configurations {
            self.configurations.insert(configuration.id.0, configuration);
        }

        let acknowledgements = crate::db::acknowledgements::load_all(pool)
            .await
            .map_err(|e| format!("failed to load acknowledgements: {e}"))?;
        let acknowledgement_count = acknowledgements.len();
        for ack in acknowledgements {
            self.acknowledgements.insert(ack.id.0, ack);
        }

        let history = crate::db::history::load_all(pool)
            .await
            .map_err(|e| format!("failed to load acknowledgement history: {e}"))?;
        let history_count = history.len();
        *self.history.write() = history;

        tracing::info!(
            customers = customer_count,
            employees = employee_count,
            templates = template_count,
            policies = policy_count,
            acknowledgements = acknowledgement_count,
            history = history_count,
            "Hydrated in-memory stores from database"
        );

        Ok(())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn employee(join: Option<DateTime<Utc>>) -> EmployeeRecord {
        let created = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        EmployeeRecord {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            role: "engineer".to_string(),
            status: EmployeeStatus::Active,
            join_date: join,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn store_try_update_missing_is_none() {
        let store: Store<u32> = Store::new();
        let out: Option<Result<(), ()>> = store.try_update(&Uuid::new_v4(), |_| Ok(()));
        assert!(out.is_none());
    }

    #[test]
    fn store_write_sees_whole_map() {
        let store: Store<String> = Store::new();
        store.insert(Uuid::new_v4(), "a".to_string());
        let inserted = store.write(|map| {
            if map.values().any(|v| v == "a") {
                false
            } else {
                map.insert(Uuid::new_v4(), "a".to_string());
                true
            }
        });
        assert!(!inserted);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn employee_directory_resolves_profiles() {
        let store = Store::new();
        let rec = employee(None);
        store.insert(rec.id, rec.clone());
        let profile = store.resolve_employee(EmployeeId::from_uuid(rec.id)).unwrap();
        assert_eq!(profile.effective_join(), rec.created_at);
        assert!(matches!(
            store.resolve_employee(EmployeeId::new()),
            Err(AttestError::NotFound { .. })
        ));
    }

    #[test]
    fn default_state_is_empty_and_in_memory() {
        let state = AppState::new();
        assert!(state.db_pool.is_none());
        assert!(state.metrics.is_none());
        assert!(state.acknowledgements.is_empty());
        assert!(state.templates.read().is_empty());
    }
}
