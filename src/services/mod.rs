//! Business logic services

pub mod dashboard;
pub mod inventory;
pub mod loans;
pub mod notifications;
pub mod policy;
pub mod reminders;

use std::sync::Arc;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

use notifications::{EmailNotifier, LoanNotifier, NoopNotifier};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub loans: loans::LoansService,
    pub dashboard: dashboard::DashboardService,
    pub inventory: inventory::InventoryService,
    pub policy: policy::PolicyService,
    pub notifications: notifications::NotificationService,
    pub reminders: reminders::ReminderService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        let notifier: Arc<dyn LoanNotifier> = if config.email.enabled {
            Arc::new(EmailNotifier::new(config.email.clone()))
        } else {
            Arc::new(NoopNotifier)
        };

        Self {
            loans: loans::LoansService::new(repository.clone(), config.lending.renewal_base),
            dashboard: dashboard::DashboardService::new(repository.clone()),
            inventory: inventory::InventoryService::new(repository.clone()),
            policy: policy::PolicyService::new(repository.clone()),
            notifications: notifications::NotificationService::new(repository.clone(), notifier.clone()),
            reminders: reminders::ReminderService::new(repository.clone(), notifier, config.reminders.clone()),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}
