//! Idempotent payment crediting.
//!
//! Every verified checkout is recorded as a payment row before any
//! package work happens; the transaction-id uniqueness constraint is
//! the dedupe authority, so replays and concurrent deliveries of the
//! same transaction credit at most once. A failure after the payment
//! row is committed never bubbles up as a processor-visible error:
//! the payment stays recorded for later reconciliation and the
//! webhook is acknowledged.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{is_valid_package_type, CheckoutEvent, Notification, NotificationBus};
use crate::error::GatewayError;
use crate::persistence::{
    LedgerStore, NewPackage, NewPaymentEvent, PackageInsert, PaymentInsert,
};

/// Result of crediting one checkout event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreditOutcome {
    /// The transaction was already fully credited; nothing changed.
    AlreadyProcessed,
    /// The purchase was credited to a package.
    Credited {
        /// Package that received the credit.
        package_id: Uuid,
        /// Package session balance after crediting.
        sessions_total: i32,
    },
    /// The payment is recorded but package crediting failed; the row
    /// awaits manual or scheduled reconciliation.
    RecordedNeedsReconciliation {
        /// Recorded payment row.
        payment_id: Uuid,
    },
}

/// Credits verified checkout events to session packages.
#[derive(Debug)]
pub struct CreditingService {
    store: Arc<dyn LedgerStore>,
    notifier: NotificationBus,
}

impl CreditingService {
    /// Creates the service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, notifier: NotificationBus) -> Self {
        Self { store, notifier }
    }

    /// Credits one checkout event, exactly once per transaction id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidPackageType`] for a package type
    /// outside the allow-list, or a persistence error if the payment
    /// row itself cannot be recorded. Errors after the payment row is
    /// committed are absorbed into
    /// [`CreditOutcome::RecordedNeedsReconciliation`].
    pub async fn credit_checkout(
        &self,
        event: &CheckoutEvent,
    ) -> Result<CreditOutcome, GatewayError> {
        // Cheap dedupe before any other work; the unique index on the
        // insert below is the authoritative check under concurrency.
        if let Some(existing) = self
            .store
            .find_payment_by_transaction(&event.transaction_id)
            .await?
        {
            if existing.package_type.is_some() {
                info!(
                    transaction_id = %event.transaction_id,
                    "duplicate transaction, already credited"
                );
                return Ok(CreditOutcome::AlreadyProcessed);
            }
        }

        if !is_valid_package_type(&event.package_type) {
            return Err(GatewayError::InvalidPackageType(event.package_type.clone()));
        }

        let new_payment = NewPaymentEvent {
            transaction_id: event.transaction_id.clone(),
            client_id: event.client_id,
            amount_cents: event.amount_cents,
            session_count: event.sessions_included,
            package_type: Some(event.package_type.clone()),
            status: "completed".to_string(),
            paid_at: event.paid_at,
        };

        let payment_id = match self.store.insert_payment_event(new_payment).await? {
            PaymentInsert::Inserted(payment) => payment.id,
            PaymentInsert::Duplicate(payment) => {
                if payment.package_type.is_some() {
                    info!(
                        transaction_id = %event.transaction_id,
                        "duplicate transaction, already credited"
                    );
                    return Ok(CreditOutcome::AlreadyProcessed);
                }
                // Legacy row recorded without metadata: attach the type
                // and resume crediting where the earlier run stopped.
                self.store
                    .attach_payment_package_type(payment.id, &event.package_type)
                    .await?;
                payment.id
            }
        };

        match self.finish_credit(event, payment_id).await {
            Ok(outcome) => Ok(outcome),
            Err(error) => {
                warn!(
                    transaction_id = %event.transaction_id,
                    %payment_id,
                    %error,
                    "payment recorded but package crediting failed"
                );
                Ok(CreditOutcome::RecordedNeedsReconciliation { payment_id })
            }
        }
    }

    /// Package resolution and linkage, after the payment row exists.
    async fn finish_credit(
        &self,
        event: &CheckoutEvent,
        payment_id: Uuid,
    ) -> Result<CreditOutcome, GatewayError> {
        let new_package = NewPackage {
            client_id: event.client_id,
            package_type: event.package_type.clone(),
            sessions_included: event.sessions_included,
            original_sessions: event.original_sessions,
            is_prorated: event.is_prorated,
            transaction_id: event.transaction_id.clone(),
            expiry_date: event.expiry_date,
            purchased_at: event.paid_at,
        };

        let active = match self
            .store
            .find_active_package(event.client_id, &event.package_type)
            .await?
        {
            Some(package) => Some(package),
            None => match self.store.insert_package(new_package.clone()).await? {
                PackageInsert::Inserted(package) => {
                    let package_id = package.id;
                    let sessions_total = package.sessions_included;
                    self.store
                        .attach_payment_package(payment_id, package_id)
                        .await?;
                    self.publish_credited(event, package_id, event.sessions_included);
                    return Ok(CreditOutcome::Credited {
                        package_id,
                        sessions_total,
                    });
                }
                // Lost the creation race; fall through to the
                // existing-package branches with the winner's row.
                PackageInsert::ActiveExists(package) => Some(package),
            },
        };

        let Some(package) = active else {
            return Err(GatewayError::Internal(
                "active package resolution yielded nothing".to_string(),
            ));
        };

        let (sessions_total, sessions_added) = match package.transaction_id.as_deref() {
            // Legacy package with no purchase linked: this purchase
            // claims it outright rather than stacking on unknown credit.
            None => {
                self.store
                    .overwrite_package_credit(package.id, &new_package)
                    .await?;
                (event.sessions_included, event.sessions_included)
            }
            Some(txn) if txn == event.transaction_id => (package.sessions_included, 0),
            Some(_) => {
                self.store
                    .add_package_credit(
                        package.id,
                        event.sessions_included,
                        event.original_sessions,
                        &event.transaction_id,
                    )
                    .await?;
                (
                    package.sessions_included + event.sessions_included,
                    event.sessions_included,
                )
            }
        };

        self.store
            .attach_payment_package(payment_id, package.id)
            .await?;
        if sessions_added > 0 {
            self.publish_credited(event, package.id, sessions_added);
        }
        Ok(CreditOutcome::Credited {
            package_id: package.id,
            sessions_total,
        })
    }

    fn publish_credited(&self, event: &CheckoutEvent, package_id: Uuid, sessions_added: i32) {
        info!(
            transaction_id = %event.transaction_id,
            client_id = %event.client_id,
            %package_id,
            sessions_added,
            "purchase credited"
        );
        self.notifier.publish(Notification::PackageCredited {
            client_id: event.client_id,
            package_id,
            package_type: event.package_type.clone(),
            sessions_added,
            timestamp: chrono::Utc::now(),
        });
    }
}
