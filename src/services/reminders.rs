//! Periodic reminder sweep for loans close to their due date

use std::{sync::Arc, time::Duration as StdDuration};

use chrono::{Duration, Utc};

use crate::{
    config::ReminderConfig,
    error::AppResult,
    models::loan::DueLoan,
    repository::Repository,
    services::notifications::LoanNotifier,
};

/// Send one reminder per loan; returns the ids of loans actually reminded
pub async fn send_reminders(notifier: &dyn LoanNotifier, loans: &[DueLoan]) -> Vec<i32> {
    let mut sent = Vec::with_capacity(loans.len());
    for loan in loans {
        match notifier.loan_due_soon(loan).await {
            Ok(()) => sent.push(loan.loan_id),
            Err(e) => tracing::warn!(loan_id = loan.loan_id, error = %e, "Reminder not sent"),
        }
    }
    sent
}

#[derive(Clone)]
pub struct ReminderService {
    repository: Repository,
    notifier: Arc<dyn LoanNotifier>,
    config: ReminderConfig,
}

impl ReminderService {
    pub fn new(repository: Repository, notifier: Arc<dyn LoanNotifier>, config: ReminderConfig) -> Self {
        Self {
            repository,
            notifier,
            config,
        }
    }

    /// Remind every active loan due within the configured window.
    /// A loan whose email failed stays eligible for the next sweep.
    pub async fn run_sweep(&self) -> AppResult<usize> {
        let until = Utc::now() + Duration::days(self.config.days_before_expiry);
        let due = self.repository.loans.due_for_reminder(until).await?;
        if due.is_empty() {
            return Ok(0);
        }

        let sent = send_reminders(self.notifier.as_ref(), &due).await;
        for loan_id in &sent {
            self.repository.loans.mark_reminder_sent(*loan_id).await?;
        }

        tracing::info!(due = due.len(), sent = sent.len(), "Reminder sweep completed");
        Ok(sent.len())
    }

    /// Run the sweep forever on the configured interval
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        let period = StdDuration::from_secs(self.config.interval_minutes.max(1) * 60);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(e) = self.run_sweep().await {
                    tracing::error!(error = %e, "Reminder sweep failed");
                }
            }
        })
    }
}
