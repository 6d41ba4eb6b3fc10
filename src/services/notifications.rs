//! Loan notifications (confirmation and due-date reminder emails)
//!
//! Notifications are best effort: a failed send is logged and never changes
//! the outcome of the loan operation that triggered it.

use std::{str::FromStr, sync::Arc};

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, Message},
    transport::smtp::authentication::Credentials,
    SmtpTransport, Transport,
};

use crate::{
    config::EmailConfig,
    error::{AppError, AppResult},
    models::{
        loan::{DueLoan, LoanDetails},
        member::Member,
    },
    repository::Repository,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanNotifier: Send + Sync {
    /// Confirm newly borrowed copies to the member
    async fn loans_borrowed(&self, member: &Member, loans: &[LoanDetails]) -> AppResult<()>;
    /// Remind the member that a loan is about to expire
    async fn loan_due_soon(&self, loan: &DueLoan) -> AppResult<()>;
}

/// Used when email delivery is disabled
pub struct NoopNotifier;

#[async_trait]
impl LoanNotifier for NoopNotifier {
    async fn loans_borrowed(&self, member: &Member, loans: &[LoanDetails]) -> AppResult<()> {
        tracing::debug!(member_id = member.id, count = loans.len(), "Email disabled, borrow confirmation dropped");
        Ok(())
    }

    async fn loan_due_soon(&self, loan: &DueLoan) -> AppResult<()> {
        tracing::debug!(loan_id = loan.loan_id, "Email disabled, reminder dropped");
        Ok(())
    }
}

/// SMTP delivery through lettre
pub struct EmailNotifier {
    config: EmailConfig,
}

impl EmailNotifier {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn transport(&self) -> AppResult<SmtpTransport> {
        let builder = if self.config.smtp_use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_host)
                .map_err(|e| AppError::Internal(format!("Failed to create SMTP transport: {}", e)))?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_host)
        }
        .port(self.config.smtp_port);

        let builder = match (&self.config.smtp_username, &self.config.smtp_password) {
            (Some(username), Some(password)) => {
                builder.credentials(Credentials::new(username.clone(), password.clone()))
            }
            _ => builder,
        };

        Ok(builder.build())
    }

    async fn send_email(&self, to: &str, subject: &str, body: String) -> AppResult<()> {
        let from_name = self.config.smtp_from_name.as_deref().unwrap_or("Libris");
        let from = Mailbox::from_str(&format!("{} <{}>", from_name, self.config.smtp_from))
            .map_err(|e| AppError::Internal(format!("Invalid from address: {}", e)))?;
        let to = Mailbox::from_str(to)
            .map_err(|e| AppError::Internal(format!("Invalid to address: {}", e)))?;

        let email = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| AppError::Internal(format!("Failed to build email: {}", e)))?;

        let mailer = self.transport()?;
        // SmtpTransport blocks on network I/O
        tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| AppError::Internal(format!("Email task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl LoanNotifier for EmailNotifier {
    async fn loans_borrowed(&self, member: &Member, loans: &[LoanDetails]) -> AppResult<()> {
        self.send_email(&member.email, "Your Libris loans", borrow_confirmation_body(member, loans))
            .await
    }

    async fn loan_due_soon(&self, loan: &DueLoan) -> AppResult<()> {
        let body = format!(
            "Hello {name},\n\n\"{book}\" is due back on {due}.\n\
             You can renew it from your account if you need more time.\n",
            name = loan.member_name,
            book = loan.book_name,
            due = loan.expiry_date.format("%Y-%m-%d"),
        );
        self.send_email(&loan.member_email, "Libris loan due soon", body)
            .await
    }
}

pub fn borrow_confirmation_body(member: &Member, loans: &[LoanDetails]) -> String {
    let mut body = format!("Hello {},\n\nYou borrowed:\n", member.name);
    for loan in loans {
        body.push_str(&format!(
            "  - {} (copy {}), due {}\n",
            loan.name,
            loan.copy_id,
            loan.expiry_date.format("%Y-%m-%d")
        ));
    }
    body
}

/// Send a borrow confirmation, logging instead of propagating failures
pub async fn deliver_borrow_confirmation(
    notifier: &dyn LoanNotifier,
    member: &Member,
    loans: &[LoanDetails],
) {
    if loans.is_empty() {
        return;
    }
    if let Err(e) = notifier.loans_borrowed(member, loans).await {
        tracing::warn!(member_id = member.id, error = %e, "Borrow confirmation not sent");
    }
}

#[derive(Clone)]
pub struct NotificationService {
    repository: Repository,
    notifier: Arc<dyn LoanNotifier>,
}

impl NotificationService {
    pub fn new(repository: Repository, notifier: Arc<dyn LoanNotifier>) -> Self {
        Self {
            repository,
            notifier,
        }
    }

    /// Fire-and-forget borrow confirmation, run after the borrow has committed
    pub fn spawn_borrow_confirmation(&self, member_id: i32, loans: Vec<LoanDetails>) {
        if loans.is_empty() {
            return;
        }
        let repository = self.repository.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match repository.members.get_by_id(member_id).await {
                Ok(member) => deliver_borrow_confirmation(notifier.as_ref(), &member, &loans).await,
                Err(e) => {
                    tracing::warn!(member_id, error = %e, "Borrow confirmation skipped")
                }
            }
        });
    }
}
