//! PostgreSQL implementation of the ledger.
//!
//! Idempotency-critical inserts use `ON CONFLICT ... DO NOTHING` and
//! report the conflict as data: the unique index on
//! `payment_events.transaction_id` and the partial unique index on
//! active packages are the serialization points described in the schema
//! migration.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::models::{NewPackage, NewPaymentEvent, PackageInsert, PaymentInsert};
use super::store::LedgerStore;
use crate::domain::{
    CalendarBinding, CalendarSide, OneOrMany, Package, PackageStatus, PaymentEvent,
    RescheduleProposal, RescheduleState, RescheduleStatus, Session, SessionId, SessionStatus,
    UserProfile,
};
use crate::error::GatewayError;

/// PostgreSQL-backed ledger using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresLedger {
    pool: PgPool,
}

type PaymentRow = (
    Uuid,
    String,
    Uuid,
    i64,
    i32,
    Option<String>,
    String,
    Option<Uuid>,
    DateTime<Utc>,
);

type PackageRow = (
    Uuid,
    Uuid,
    String,
    i32,
    i32,
    bool,
    String,
    Option<String>,
    Option<NaiveDate>,
    DateTime<Utc>,
); // id, client, type, sessions, original, prorated, status, txn, expiry, purchased

type SessionRow = (
    Uuid,
    Uuid,
    Uuid,
    NaiveDate,
    NaiveTime,
    Option<NaiveTime>,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    Option<NaiveDate>,
    Option<NaiveTime>,
    Option<NaiveTime>,
    Option<String>,
    Option<String>,
);

const PAYMENT_COLUMNS: &str = "id, transaction_id, client_id, amount_cents, session_count, \
     package_type, status, package_id, paid_at";

const PACKAGE_COLUMNS: &str = "id, client_id, package_type, sessions_included, \
     original_sessions, is_prorated, status, transaction_id, expiry_date, purchased_at";

const SESSION_COLUMNS: &str = "id, trainer_id, client_id, session_date, start_time, end_time, \
     status, session_type, trainer_event_id, client_event_id, reschedule_status, proposed_date, \
     proposed_start_time, proposed_end_time, reschedule_reason, response_note";

impl PostgresLedger {
    /// Creates a new ledger with the given connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_err(e: sqlx::Error) -> GatewayError {
    GatewayError::PersistenceError(e.to_string())
}

fn payment_from_row(row: PaymentRow) -> PaymentEvent {
    let (id, transaction_id, client_id, amount_cents, session_count, package_type, status, package_id, paid_at) =
        row;
    PaymentEvent {
        id,
        transaction_id,
        client_id,
        amount_cents,
        session_count,
        package_type,
        status,
        package_id,
        paid_at,
    }
}

fn package_from_row(row: PackageRow) -> Result<Package, GatewayError> {
    let (id, client_id, package_type, sessions_included, original_sessions, is_prorated, status, transaction_id, expiry_date, purchased_at) =
        row;
    let status = PackageStatus::parse(&status).ok_or_else(|| {
        GatewayError::PersistenceError(format!("unknown package status: {status}"))
    })?;
    Ok(Package {
        id,
        client_id,
        package_type,
        sessions_included,
        original_sessions,
        is_prorated,
        status,
        transaction_id,
        expiry_date,
        purchased_at,
    })
}

fn session_from_row(row: SessionRow) -> Result<Session, GatewayError> {
    let (
        id,
        trainer_id,
        client_id,
        date,
        start_time,
        end_time,
        status,
        session_type,
        trainer_event_id,
        client_event_id,
        reschedule_status,
        proposed_date,
        proposed_start_time,
        proposed_end_time,
        reschedule_reason,
        response_note,
    ) = row;

    let status = SessionStatus::parse(&status).ok_or_else(|| {
        GatewayError::PersistenceError(format!("unknown session status: {status}"))
    })?;
    let reschedule_status = RescheduleStatus::parse(&reschedule_status).ok_or_else(|| {
        GatewayError::PersistenceError(format!(
            "unknown reschedule status: {reschedule_status}"
        ))
    })?;

    Ok(Session {
        id: SessionId::from_uuid(id),
        trainer_id,
        client_id,
        date,
        start_time,
        end_time,
        status,
        session_type,
        trainer_event_id,
        client_event_id,
        reschedule: RescheduleState {
            status: reschedule_status,
            proposed_date,
            proposed_start_time,
            proposed_end_time,
            reason: reschedule_reason,
            response_note,
        },
    })
}

#[async_trait]
impl LedgerStore for PostgresLedger {
    async fn find_payment_by_transaction(
        &self,
        transaction_id: &str,
    ) -> Result<Option<PaymentEvent>, GatewayError> {
        let row = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payment_events WHERE transaction_id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(payment_from_row))
    }

    async fn insert_payment_event(
        &self,
        new: NewPaymentEvent,
    ) -> Result<PaymentInsert, GatewayError> {
        // The unique index turns a concurrent duplicate delivery into a
        // no-row result rather than a second insert.
        let inserted = sqlx::query_as::<_, PaymentRow>(&format!(
            "INSERT INTO payment_events \
             (id, transaction_id, client_id, amount_cents, session_count, package_type, status, paid_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (transaction_id) DO NOTHING \
             RETURNING {PAYMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new.transaction_id)
        .bind(new.client_id)
        .bind(new.amount_cents)
        .bind(new.session_count)
        .bind(&new.package_type)
        .bind(&new.status)
        .bind(new.paid_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = inserted {
            return Ok(PaymentInsert::Inserted(payment_from_row(row)));
        }

        let existing = self
            .find_payment_by_transaction(&new.transaction_id)
            .await?
            .ok_or_else(|| {
                GatewayError::PersistenceError(format!(
                    "payment insert conflicted but row not found: {}",
                    new.transaction_id
                ))
            })?;
        Ok(PaymentInsert::Duplicate(existing))
    }

    async fn attach_payment_package_type(
        &self,
        payment_id: Uuid,
        package_type: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE payment_events SET package_type = $2 WHERE id = $1 AND package_type IS NULL",
        )
        .bind(payment_id)
        .bind(package_type)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn attach_payment_package(
        &self,
        payment_id: Uuid,
        package_id: Uuid,
    ) -> Result<(), GatewayError> {
        sqlx::query("UPDATE payment_events SET package_id = $2 WHERE id = $1")
            .bind(payment_id)
            .bind(package_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn find_active_package(
        &self,
        client_id: Uuid,
        package_type: &str,
    ) -> Result<Option<Package>, GatewayError> {
        let row = sqlx::query_as::<_, PackageRow>(&format!(
            "SELECT {PACKAGE_COLUMNS} FROM packages \
             WHERE client_id = $1 AND package_type = $2 AND status = 'active'"
        ))
        .bind(client_id)
        .bind(package_type)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(package_from_row).transpose()
    }

    async fn insert_package(&self, new: NewPackage) -> Result<PackageInsert, GatewayError> {
        // Partial unique index on (client_id, package_type) WHERE active:
        // a conflict means a concurrent crediting call created the package
        // first, and the caller adds to it instead.
        let inserted = sqlx::query_as::<_, PackageRow>(&format!(
            "INSERT INTO packages \
             (id, client_id, package_type, sessions_included, original_sessions, is_prorated, \
              status, transaction_id, expiry_date, purchased_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'active', $7, $8, $9) \
             ON CONFLICT (client_id, package_type) WHERE status = 'active' DO NOTHING \
             RETURNING {PACKAGE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.client_id)
        .bind(&new.package_type)
        .bind(new.sessions_included)
        .bind(new.original_sessions)
        .bind(new.is_prorated)
        .bind(&new.transaction_id)
        .bind(new.expiry_date)
        .bind(new.purchased_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        if let Some(row) = inserted {
            return Ok(PackageInsert::Inserted(package_from_row(row)?));
        }

        let existing = self
            .find_active_package(new.client_id, &new.package_type)
            .await?
            .ok_or_else(|| {
                GatewayError::PersistenceError(format!(
                    "package insert conflicted but active row not found for client {}",
                    new.client_id
                ))
            })?;
        Ok(PackageInsert::ActiveExists(existing))
    }

    async fn overwrite_package_credit(
        &self,
        package_id: Uuid,
        new: &NewPackage,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE packages SET sessions_included = $2, original_sessions = $3, \
             is_prorated = $4, transaction_id = $5, expiry_date = $6, purchased_at = $7 \
             WHERE id = $1",
        )
        .bind(package_id)
        .bind(new.sessions_included)
        .bind(new.original_sessions)
        .bind(new.is_prorated)
        .bind(&new.transaction_id)
        .bind(new.expiry_date)
        .bind(new.purchased_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn add_package_credit(
        &self,
        package_id: Uuid,
        sessions_included: i32,
        original_sessions: i32,
        transaction_id: &str,
    ) -> Result<(), GatewayError> {
        sqlx::query(
            "UPDATE packages SET sessions_included = sessions_included + $2, \
             original_sessions = original_sessions + $3, transaction_id = $4 \
             WHERE id = $1",
        )
        .bind(package_id)
        .bind(sessions_included)
        .bind(original_sessions)
        .bind(transaction_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn find_session(&self, id: SessionId) -> Result<Option<Session>, GatewayError> {
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.map(session_from_row).transpose()
    }

    async fn list_pair_sessions(
        &self,
        trainer_id: Uuid,
        client_id: Uuid,
    ) -> Result<Vec<Session>, GatewayError> {
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {SESSION_COLUMNS} FROM sessions \
             WHERE trainer_id = $1 AND client_id = $2 AND status != 'cancelled' \
             ORDER BY session_date, start_time"
        ))
        .bind(trainer_id)
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;

        rows.into_iter().map(session_from_row).collect()
    }

    async fn set_session_event_id(
        &self,
        id: SessionId,
        side: CalendarSide,
        event_id: Option<&str>,
    ) -> Result<(), GatewayError> {
        let sql = match side {
            CalendarSide::Trainer => "UPDATE sessions SET trainer_event_id = $2 WHERE id = $1",
            CalendarSide::Client => "UPDATE sessions SET client_event_id = $2 WHERE id = $1",
        };
        sqlx::query(sql)
            .bind(*id.as_uuid())
            .bind(event_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn propose_reschedule(
        &self,
        id: SessionId,
        proposal: &RescheduleProposal,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE sessions SET reschedule_status = 'pending', proposed_date = $2, \
             proposed_start_time = $3, proposed_end_time = $4, reschedule_reason = $5, \
             response_note = NULL \
             WHERE id = $1",
        )
        .bind(*id.as_uuid())
        .bind(proposal.date)
        .bind(proposal.start_time)
        .bind(proposal.end_time)
        .bind(&proposal.reason)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn approve_reschedule(&self, id: SessionId) -> Result<bool, GatewayError> {
        // Single statement: the date/time swap and the status transition
        // are one atomic compare-and-set, so a concurrent deny or second
        // approval can never both apply.
        let result = sqlx::query(
            "UPDATE sessions SET session_date = proposed_date, \
             start_time = proposed_start_time, end_time = proposed_end_time, \
             reschedule_status = 'approved' \
             WHERE id = $1 AND reschedule_status = 'pending' AND proposed_date IS NOT NULL",
        )
        .bind(*id.as_uuid())
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn deny_reschedule(
        &self,
        id: SessionId,
        note: Option<&str>,
    ) -> Result<bool, GatewayError> {
        let result = sqlx::query(
            "UPDATE sessions SET reschedule_status = 'denied', response_note = $2 \
             WHERE id = $1 AND reschedule_status = 'pending'",
        )
        .bind(*id.as_uuid())
        .bind(note)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_event_references(&self) -> Result<u64, GatewayError> {
        let result = sqlx::query(
            "UPDATE sessions SET trainer_event_id = NULL, client_event_id = NULL \
             WHERE trainer_event_id IS NOT NULL OR client_event_id IS NOT NULL",
        )
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(result.rows_affected())
    }

    async fn find_binding(&self, user_id: Uuid) -> Result<Option<CalendarBinding>, GatewayError> {
        let row = sqlx::query_as::<_, (Uuid, String, String, DateTime<Utc>)>(
            "SELECT user_id, refresh_token, calendar_id, connected_at \
             FROM calendar_bindings WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(row.map(
            |(user_id, refresh_token, calendar_id, connected_at)| CalendarBinding {
                user_id,
                refresh_token,
                calendar_id,
                connected_at,
            },
        ))
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<UserProfile>, GatewayError> {
        // The profile arrives as JSON whose cardinality depends on the
        // aggregation used; normalize through OneOrMany before it reaches
        // any business logic.
        let value = sqlx::query_scalar::<_, serde_json::Value>(
            "SELECT COALESCE(json_agg(json_build_object( \
                 'user_id', u.id, 'name', u.name, 'email', u.email, 'role', u.role \
             )), '[]'::json) \
             FROM users u WHERE u.id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        let parsed: OneOrMany<UserProfile> = serde_json::from_value(value)
            .map_err(|e| GatewayError::PersistenceError(format!("malformed profile row: {e}")))?;
        Ok(parsed.normalize())
    }
}
