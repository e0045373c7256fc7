//! Saves the validated items of a scan as expenses.

use time::OffsetDateTime;

use crate::{
    Error,
    expense::{Expense, ExpenseDraft, ExpenseStore},
    scan::validate::ValidatedItem,
    user::UserID,
};

/// Save each item as an expense owned by `owner_id`.
///
/// Every expense in the batch gets the same date: `occurred_at` if the scan
/// had one, otherwise the current time. The item name becomes the expense
/// category.
///
/// The inserts run concurrently on the blocking thread pool and are joined in
/// the order of `items`, so the returned expenses are in the same order as
/// the items. Saved expenses are not removed when another insert in the
/// batch fails.
///
/// # Errors
///
/// Returns a:
/// - [Error::InvalidOwnerIdentity] if `owner_id` is not a valid identity for `store`,
/// - [Error::NoValidItems] if `items` is empty, in which case nothing is saved,
/// - or [Error::PartialPersistenceFailure] if one or more inserts failed.
pub async fn materialize<S>(
    store: &S,
    owner_id: &str,
    items: Vec<ValidatedItem>,
    occurred_at: Option<OffsetDateTime>,
) -> Result<Vec<Expense>, Error>
where
    S: ExpenseStore + Clone + Send + 'static,
{
    if !store.is_valid_identity(owner_id) {
        return Err(Error::InvalidOwnerIdentity(owner_id.to_owned()));
    }

    let user_id: UserID = owner_id.parse()?;

    if items.is_empty() {
        return Err(Error::NoValidItems);
    }

    let date = occurred_at.unwrap_or_else(OffsetDateTime::now_utc);

    let inserts: Vec<_> = items
        .into_iter()
        .map(|item| {
            let store = store.clone();
            let draft = ExpenseDraft {
                user_id,
                category: item.name,
                amount: item.amount,
                date,
            };

            tokio::task::spawn_blocking(move || store.insert(draft))
        })
        .collect();

    let attempted = inserts.len();
    let mut expenses = Vec::with_capacity(attempted);
    let mut failed = 0;

    for insert in inserts {
        match insert.await {
            Ok(Ok(expense)) => expenses.push(expense),
            Ok(Err(error)) => {
                tracing::error!("could not save scanned expense: {error}");
                failed += 1;
            }
            Err(error) => {
                tracing::error!("the task saving a scanned expense did not finish: {error}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(Error::PartialPersistenceFailure { failed, attempted });
    }

    tracing::debug!("saved {attempted} scanned expenses for user {user_id}");

    Ok(expenses)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        Error,
        expense::SQLiteExpenseStore,
        scan::{materialize::materialize, validate::ValidatedItem},
        test_utils::{RecordingStore, create_test_user, get_test_connection},
    };

    fn item(name: &str, price: f64, quantity: f64) -> ValidatedItem {
        ValidatedItem {
            name: name.to_owned(),
            price,
            quantity,
            amount: price * quantity,
        }
    }

    #[tokio::test]
    async fn saves_items_in_order_with_shared_date() {
        let store = RecordingStore::default();
        let date = datetime!(2025-06-01 9:15 UTC);
        let items = vec![item("Milk", 2.5, 2.0), item("Bread", 3.0, 1.0), item("Eggs", 6.0, 1.0)];

        let expenses = materialize(&store, "7", items, Some(date)).await.unwrap();

        let categories: Vec<&str> = expenses.iter().map(|e| e.category.as_str()).collect();
        assert_eq!(categories, vec!["Milk", "Bread", "Eggs"]);
        assert!(expenses.iter().all(|expense| expense.date == date));
        assert!(expenses.iter().all(|expense| expense.user_id.as_i64() == 7));
        assert_eq!(expenses[0].amount, 5.0);
        assert_eq!(store.inserted().len(), 3);
    }

    #[tokio::test]
    async fn uses_current_time_without_scan_date() {
        let store = RecordingStore::default();
        let before = OffsetDateTime::now_utc();

        let expenses = materialize(&store, "1", vec![item("Tea", 3.0, 1.0)], None)
            .await
            .unwrap();

        let after = OffsetDateTime::now_utc();
        assert!(before <= expenses[0].date && expenses[0].date <= after);
    }

    #[tokio::test]
    async fn empty_batch_saves_nothing() {
        let store = RecordingStore::default();

        let result = materialize(&store, "1", vec![], None).await;

        assert_eq!(result, Err(Error::NoValidItems));
        assert!(store.inserted().is_empty());
    }

    #[tokio::test]
    async fn invalid_owner_saves_nothing() {
        let store = RecordingStore::default();

        let result = materialize(&store, "not-an-id", vec![item("Tea", 3.0, 1.0)], None).await;

        assert_eq!(
            result,
            Err(Error::InvalidOwnerIdentity("not-an-id".to_owned()))
        );
        assert!(store.inserted().is_empty());
    }

    #[tokio::test]
    async fn failed_inserts_are_reported_without_rollback() {
        let store = RecordingStore::failing_on("Bread");
        let items = vec![item("Milk", 2.5, 2.0), item("Bread", 3.0, 1.0), item("Eggs", 6.0, 1.0)];

        let result = materialize(&store, "1", items, None).await;

        assert_eq!(
            result,
            Err(Error::PartialPersistenceFailure {
                failed: 1,
                attempted: 3
            })
        );
        let mut saved: Vec<String> = store
            .inserted()
            .into_iter()
            .map(|draft| draft.category)
            .collect();
        saved.sort();
        assert_eq!(saved, vec!["Eggs", "Milk"]);
    }

    #[tokio::test]
    async fn saves_to_sqlite() {
        let conn = get_test_connection();
        let user = create_test_user(&conn);
        let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(conn)));
        let owner = user.id.to_string();

        let expenses = materialize(&store, &owner, vec![item("Widget", 4.0, 3.0), item("Box", 5.0, 1.0)], None)
            .await
            .unwrap();

        let mut ids: Vec<i64> = expenses.iter().map(|expense| expense.id).collect();
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(expenses[0].amount, 12.0);
        assert_eq!(expenses[1].amount, 5.0);
    }

    #[tokio::test]
    async fn unknown_owner_fails_every_insert() {
        let store = SQLiteExpenseStore::new(Arc::new(Mutex::new(get_test_connection())));

        let result = materialize(&store, "99", vec![item("Widget", 4.0, 3.0), item("Box", 5.0, 1.0)], None).await;

        assert_eq!(
            result,
            Err(Error::PartialPersistenceFailure {
                failed: 2,
                attempted: 2
            })
        );
    }
}
