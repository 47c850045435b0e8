//! External user/profile store.
//!
//! When `DATABASE_URL` is configured the service reads the `users` and
//! `financial_profiles` tables through a [`UserStore`]; otherwise every
//! endpoint uniformly falls back to the fixed mock dataset below. Absence
//! of the store is a supported mode, not an error.

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::errors::{AppError, ResultExt};
use crate::models::{StoredProfile, UserRecord, UserRow};

/// Queryable handle on the external profile store.
#[derive(Clone)]
pub struct UserStore {
    pool: PgPool,
}

impl UserStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        // Probe the connection before declaring the store usable
        sqlx::query("SELECT 1").execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Fetches a user row by id. `Ok(None)` when the id is unknown.
    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<UserRow>, AppError> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, name, age, city, occupation FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context(format!("fetching user {}", user_id))
    }

    /// Fetches the financial profile row for a user. `Ok(None)` when absent.
    pub async fn fetch_profile(&self, user_id: i64) -> Result<Option<StoredProfile>, AppError> {
        sqlx::query_as::<_, StoredProfile>(
            "SELECT user_id, upi_transactions, avg_transaction_amount, bill_payments_on_time, \
             total_bill_payments, mobile_recharge_regularity, savings_pattern, \
             monthly_income_estimate, current_score \
             FROM financial_profiles WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context(format!("fetching financial profile for user {}", user_id))
    }
}

/// Fixed sample dataset served when no external store is configured.
pub mod mock {
    use super::*;

    /// Looks up a sample user by id. Ids 1 to 3 exist.
    pub fn user(user_id: i64) -> Option<UserRecord> {
        let (user, financial_profile) = match user_id {
            1 => (
                UserRow {
                    id: 1,
                    name: "Raj Kumar".to_string(),
                    age: 32,
                    city: "Mumbai".to_string(),
                    occupation: "Gig Worker (Delivery)".to_string(),
                },
                StoredProfile {
                    user_id: 1,
                    upi_transactions: 45,
                    avg_transaction_amount: 320.0,
                    bill_payments_on_time: 18,
                    total_bill_payments: 24,
                    mobile_recharge_regularity: 0.85,
                    savings_pattern: 0.40,
                    monthly_income_estimate: 22000.0,
                    current_score: None,
                },
            ),
            2 => (
                UserRow {
                    id: 2,
                    name: "Priya Sharma".to_string(),
                    age: 28,
                    city: "Bengaluru".to_string(),
                    occupation: "Salaried - Retail Worker".to_string(),
                },
                StoredProfile {
                    user_id: 2,
                    upi_transactions: 92,
                    avg_transaction_amount: 850.0,
                    bill_payments_on_time: 23,
                    total_bill_payments: 24,
                    mobile_recharge_regularity: 0.96,
                    savings_pattern: 0.72,
                    monthly_income_estimate: 38000.0,
                    current_score: None,
                },
            ),
            3 => (
                UserRow {
                    id: 3,
                    name: "Amit Patel".to_string(),
                    age: 21,
                    city: "Ahmedabad".to_string(),
                    occupation: "Student / Part-time Worker".to_string(),
                },
                StoredProfile {
                    user_id: 3,
                    upi_transactions: 20,
                    avg_transaction_amount: 150.0,
                    bill_payments_on_time: 8,
                    total_bill_payments: 12,
                    mobile_recharge_regularity: 0.60,
                    savings_pattern: 0.22,
                    monthly_income_estimate: 8000.0,
                    current_score: None,
                },
            ),
            _ => return None,
        };

        Some(UserRecord {
            user,
            financial_profile,
        })
    }

    /// Financial profile only, for the refresh simulation.
    pub fn profile(user_id: i64) -> Option<StoredProfile> {
        user(user_id).map(|record| record.financial_profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_dataset_has_three_users() {
        assert!(mock::user(1).is_some());
        assert!(mock::user(2).is_some());
        assert!(mock::user(3).is_some());
        assert!(mock::user(0).is_none());
        assert!(mock::user(999).is_none());
    }

    #[test]
    fn mock_profiles_are_within_scoring_bounds() {
        for id in 1..=3 {
            let p = mock::profile(id).unwrap();
            assert!((0..=500).contains(&p.upi_transactions));
            assert!((0..=24).contains(&p.bill_payments_on_time));
            assert!((0.0..=1.0).contains(&p.mobile_recharge_regularity));
            assert!((0.0..=1.0).contains(&p.savings_pattern));
        }
    }
}
