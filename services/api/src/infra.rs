use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::warn;
use schoolhouse::workflows::admissions::{
    AdmissionsService, DecisionNotice, DecisionNotifier, InMemoryAdmissionsRepository,
    NotificationError,
};
use schoolhouse::workflows::integrations::{Channel, CredentialShapeClient, IntegrationRegistry};
use schoolhouse::workflows::onboarding::{InMemoryTenantRepository, OnboardingService};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type Registry = IntegrationRegistry<CredentialShapeClient>;
pub(crate) type Admissions = AdmissionsService<InMemoryAdmissionsRepository, EmailOutbox>;
pub(crate) type Onboarding = OnboardingService<InMemoryTenantRepository>;

/// Applicant notice waiting for the e-mail provider to pick it up.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct OutboxEntry {
    pub(crate) queued_at: DateTime<Utc>,
    pub(crate) notice: DecisionNotice,
}

/// Notices kept before the oldest queued one is dropped.
pub(crate) const OUTBOX_CAPACITY: usize = 512;

/// Queues applicant notices while the e-mail channel is connected. The queue is bounded: once
/// full, the oldest notice is dropped.
#[derive(Clone)]
pub(crate) struct EmailOutbox {
    registry: Arc<Registry>,
    capacity: usize,
    entries: Arc<Mutex<VecDeque<OutboxEntry>>>,
}

impl EmailOutbox {
    pub(crate) fn new(registry: Arc<Registry>) -> Self {
        Self::with_capacity(registry, OUTBOX_CAPACITY)
    }

    pub(crate) fn with_capacity(registry: Arc<Registry>, capacity: usize) -> Self {
        Self {
            registry,
            capacity: capacity.max(1),
            entries: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    /// Hand every queued notice to the caller and empty the queue.
    pub(crate) fn drain(&self) -> Vec<OutboxEntry> {
        self.guard().drain(..).collect()
    }

    fn guard(&self) -> MutexGuard<'_, VecDeque<OutboxEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl DecisionNotifier for EmailOutbox {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NotificationError> {
        if !self.registry.is_connected(Channel::Email) {
            return Err(NotificationError::Transport(
                "email channel is not connected".to_string(),
            ));
        }
        let mut entries = self.guard();
        if entries.len() >= self.capacity {
            if let Some(dropped) = entries.pop_front() {
                warn!(
                    template = %dropped.notice.template,
                    application_id = %dropped.notice.application_id,
                    capacity = self.capacity,
                    "email outbox full, oldest notice dropped"
                );
            }
        }
        entries.push_back(OutboxEntry {
            queued_at: Utc::now(),
            notice,
        });
        Ok(())
    }
}

/// Services wired against the in-process stores.
pub(crate) struct Services {
    pub(crate) registry: Arc<Registry>,
    pub(crate) outbox: EmailOutbox,
    pub(crate) admissions: Arc<Admissions>,
    pub(crate) onboarding: Arc<Onboarding>,
}

impl Services {
    pub(crate) fn in_memory(registry: Registry) -> Self {
        let registry = Arc::new(registry);
        let outbox = EmailOutbox::new(registry.clone());
        let admissions = Arc::new(AdmissionsService::new(
            Arc::new(InMemoryAdmissionsRepository::default()),
            Arc::new(outbox.clone()),
        ));
        let onboarding = Arc::new(OnboardingService::new(Arc::new(
            InMemoryTenantRepository::default(),
        )));
        Self {
            registry,
            outbox,
            admissions,
            onboarding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use schoolhouse::workflows::admissions::ApplicationId;
    use schoolhouse::workflows::integrations::Credentials;
    use std::collections::BTreeMap;

    fn notice() -> DecisionNotice {
        DecisionNotice {
            template: "application_received".to_string(),
            application_id: ApplicationId("app-000001".to_string()),
            recipient: "sam@example.com".to_string(),
            details: BTreeMap::new(),
        }
    }

    #[test]
    fn outbox_requires_connected_email_channel() {
        let services = Services::in_memory(Registry::new(Arc::new(CredentialShapeClient)));
        assert!(services.outbox.publish(notice()).is_err());

        services
            .registry
            .connect(Channel::Email, Credentials::api_key("mail-key"))
            .expect("email connects");
        services.outbox.publish(notice()).expect("queued");
        assert_eq!(services.outbox.drain().len(), 1);
    }

    #[test]
    fn full_outbox_drops_the_oldest_notice() {
        let registry = Arc::new(Registry::new(Arc::new(CredentialShapeClient)));
        registry
            .connect(Channel::Email, Credentials::api_key("mail-key"))
            .expect("email connects");
        let outbox = EmailOutbox::with_capacity(registry, 2);

        for template in [
            "application_received",
            "application_approved",
            "application_rejected",
        ] {
            let mut queued = notice();
            queued.template = template.to_string();
            outbox.publish(queued).expect("queued");
        }

        let templates: Vec<String> = outbox
            .drain()
            .into_iter()
            .map(|entry| entry.notice.template)
            .collect();
        assert_eq!(templates, vec!["application_approved", "application_rejected"]);
        assert!(outbox.drain().is_empty());
    }
}
