// SPDX-FileCopyrightText: 2026 Wordcast Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Subscription queries used by the daily batch run.

use rusqlite::params;
use wordcast_core::WordcastError;
use wordcast_core::types::Subscription;

use crate::database::{Database, map_tr_err};
use crate::models::parsed_column;

/// Store the user's subscription, replacing any earlier category.
pub async fn upsert_subscription(
    db: &Database,
    subscription: &Subscription,
) -> Result<(), WordcastError> {
    let sub = subscription.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO subscriptions (user_id, category, phone_number, active) \
                 VALUES (?1, ?2, ?3, ?4) \
                 ON CONFLICT(user_id) DO UPDATE SET \
                 category = excluded.category, phone_number = excluded.phone_number, \
                 active = excluded.active, \
                 updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')",
                params![sub.user_id, sub.category.to_string(), sub.phone_number, sub.active],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Active subscriptions ordered by user.
pub async fn list_active_subscriptions(db: &Database) -> Result<Vec<Subscription>, WordcastError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, phone_number, category, active FROM subscriptions \
                 WHERE active = 1 ORDER BY user_id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(Subscription {
                    user_id: row.get(0)?,
                    phone_number: row.get(1)?,
                    category: parsed_column(row, 2)?,
                    active: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn inactive_subscriptions_are_skipped() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("subs.db").to_str().unwrap())
            .await
            .unwrap();

        let mut sub = Subscription {
            user_id: "u1".into(),
            phone_number: "+15550001111".into(),
            category: "business-advanced".parse().unwrap(),
            active: true,
        };
        upsert_subscription(&db, &sub).await.unwrap();
        upsert_subscription(
            &db,
            &Subscription {
                user_id: "u2".into(),
                phone_number: "+15550002222".into(),
                category: "exam-beginner".parse().unwrap(),
                active: true,
            },
        )
        .await
        .unwrap();

        sub.active = false;
        upsert_subscription(&db, &sub).await.unwrap();

        let active = list_active_subscriptions(&db).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].user_id, "u2");
    }

    #[tokio::test]
    async fn resubscribing_updates_phone_number() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("subs.db").to_str().unwrap())
            .await
            .unwrap();
        let mut sub = Subscription {
            user_id: "u1".into(),
            phone_number: "+15550001111".into(),
            category: "everyday-intermediate".parse().unwrap(),
            active: true,
        };
        upsert_subscription(&db, &sub).await.unwrap();
        sub.phone_number = "+15559998888".into();
        upsert_subscription(&db, &sub).await.unwrap();

        let active = list_active_subscriptions(&db).await.unwrap();
        assert_eq!(active, vec![sub]);
    }

    #[tokio::test]
    async fn resubscribing_to_another_category_replaces_it() {
        let dir = tempdir().unwrap();
        let db = Database::open(dir.path().join("subs.db").to_str().unwrap())
            .await
            .unwrap();
        let mut sub = Subscription {
            user_id: "u1".into(),
            phone_number: "+15550001111".into(),
            category: "business-intermediate".parse().unwrap(),
            active: true,
        };
        upsert_subscription(&db, &sub).await.unwrap();
        sub.category = "exam-advanced".parse().unwrap();
        upsert_subscription(&db, &sub).await.unwrap();

        let active = list_active_subscriptions(&db).await.unwrap();
        assert_eq!(active, vec![sub]);
    }
}
