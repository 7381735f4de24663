//! Macro-generated test suite for `OrderStore` contract validation.
//!
//! The `order_store_tests!` macro generates a test module that validates any
//! `OrderStore` implementation against the contract: CRUD on order numbers,
//! natural ordering, the unique order number, and concurrent access.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use measureon::storage::InMemoryOrderStore;
//!
//! order_store_tests!(InMemoryOrderStore::new());
//! ```
//!
//! # Generated Tests
//!
//! ## CRUD
//! - `test_insert_and_get`: insert then retrieve, every field survives
//! - `test_get_nonexistent`: unknown order number returns None
//! - `test_list_empty`: empty store lists nothing
//! - `test_list_keeps_insertion_order`: insert 5, listed in insertion order
//! - `test_update_existing`: every mutable column is written
//! - `test_update_nonexistent`: no-op, no new row
//! - `test_delete_existing` / `test_delete_nonexistent`
//!
//! ## Order numbers
//! - `test_max_order_number_empty` / `test_max_order_number_with_gaps`
//! - `test_duplicate_order_number_rejected`
//!
//! ## Edge Cases
//! - `test_free_text_and_custom_status_round_trip`
//! - `test_concurrent_access`: parallel inserts from spawned tasks

/// Generate a full `OrderStore` conformance test suite.
///
/// `$factory` must evaluate to a fresh, empty store implementing
/// `OrderStore + Clone + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! order_store_tests {
    ($factory:expr) => {
        mod order_store_contract_tests {
            use super::*;
            use measureon::core::{OrderStatus, OrderStore, StorageError};

            // ==================================================================
            // CRUD
            // ==================================================================

            #[tokio::test]
            async fn test_insert_and_get() {
                let store = $factory;
                let order = sample_order(1);

                let stored = store.insert(order.clone()).await.unwrap();
                assert!(stored.id > 0, "Storage should assign a positive id");
                assert_same_order(&stored, &order);

                let retrieved = store.get(1).await.unwrap();
                assert!(retrieved.is_some(), "Order should exist after insert");
                let retrieved = retrieved.unwrap();
                assert_eq!(retrieved.id, stored.id);
                assert_same_order(&retrieved, &order);
            }

            #[tokio::test]
            async fn test_get_nonexistent() {
                let store = $factory;
                assert!(store.get(42).await.unwrap().is_none());
            }

            #[tokio::test]
            async fn test_list_empty() {
                let store = $factory;
                assert!(store.list().await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_list_keeps_insertion_order() {
                let store = $factory;
                for n in [5, 2, 9, 1, 7] {
                    store.insert(sample_order(n)).await.unwrap();
                }

                let all = store.list().await.unwrap();
                assert_eq!(order_numbers(&all), vec![5, 2, 9, 1, 7]);
            }

            #[tokio::test]
            async fn test_update_existing() {
                let store = $factory;
                let stored = store.insert(sample_order(3)).await.unwrap();

                let mut changed = stored.clone();
                changed.shirts = 4;
                changed.pants = 0;
                changed.shorts = 2;
                changed.delivery_date = "2024-7-1".to_string();
                changed.total_price = 2600.0;
                changed.status = OrderStatus::Ready;
                changed.is_starred = true;
                changed.is_ready = true;
                changed.measurements = "A|B|C".to_string();
                changed.image_uri = Some("content://photos/3".to_string());
                assert!(store.update(changed.clone()).await.unwrap());

                let retrieved = store.get(3).await.unwrap().unwrap();
                assert_eq!(retrieved, changed);
            }

            #[tokio::test]
            async fn test_update_nonexistent() {
                let store = $factory;
                assert!(!store.update(sample_order(8)).await.unwrap());
                assert!(store.list().await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_delete_existing() {
                let store = $factory;
                for order in sample_batch(3) {
                    store.insert(order).await.unwrap();
                }

                store.delete(2).await.unwrap();

                assert!(store.get(2).await.unwrap().is_none());
                assert_eq!(order_numbers(&store.list().await.unwrap()), vec![1, 3]);
            }

            #[tokio::test]
            async fn test_delete_nonexistent() {
                let store = $factory;
                store.insert(sample_order(1)).await.unwrap();

                store.delete(99).await.unwrap();
                assert_eq!(store.list().await.unwrap().len(), 1);
            }

            // ==================================================================
            // Order numbers
            // ==================================================================

            #[tokio::test]
            async fn test_max_order_number_empty() {
                let store = $factory;
                assert_eq!(store.max_order_number().await.unwrap(), None);
            }

            #[tokio::test]
            async fn test_max_order_number_with_gaps() {
                let store = $factory;
                for n in [1, 2, 3] {
                    store.insert(sample_order(n)).await.unwrap();
                }
                store.delete(2).await.unwrap();

                assert_eq!(store.max_order_number().await.unwrap(), Some(3));

                store.delete(3).await.unwrap();
                assert_eq!(store.max_order_number().await.unwrap(), Some(1));
            }

            #[tokio::test]
            async fn test_duplicate_order_number_rejected() {
                let store = $factory;
                store.insert(sample_order(1)).await.unwrap();

                let mut other = sample_order(1);
                other.customer_number = "0311-0000000".to_string();
                let err = store.insert(other).await.unwrap_err();

                assert_eq!(
                    err.downcast_ref::<StorageError>(),
                    Some(&StorageError::DuplicateOrderNumber(1))
                );
                let kept = store.get(1).await.unwrap().unwrap();
                assert_eq!(kept.customer_number, sample_order(1).customer_number);
            }

            // ==================================================================
            // Edge Cases
            // ==================================================================

            #[tokio::test]
            async fn test_free_text_and_custom_status_round_trip() {
                let store = $factory;
                let mut order = sample_order(11);
                order.status = OrderStatus::Other("Altering".to_string());
                order.delivery_date = "next friday".to_string();
                order.measurements = "chest 40, 'slim'||".to_string();

                store.insert(order.clone()).await.unwrap();
                let retrieved = store.get(11).await.unwrap().unwrap();

                assert_same_order(&retrieved, &order);
            }

            #[tokio::test]
            async fn test_concurrent_access() {
                let store = $factory;
                let s1 = store.clone();
                let s2 = store.clone();

                let h1 = tokio::spawn(async move { s1.insert(sample_order(1)).await });
                let h2 = tokio::spawn(async move { s2.insert(sample_order(2)).await });

                let (r1, r2) = tokio::time::timeout(std::time::Duration::from_secs(30), async {
                    tokio::try_join!(h1, h2).unwrap()
                })
                .await
                .expect("Concurrent inserts timed out after 30s, possible deadlock");

                r1.unwrap();
                r2.unwrap();

                let mut numbers = order_numbers(&store.list().await.unwrap());
                numbers.sort();
                assert_eq!(numbers, vec![1, 2]);
            }
        }
    };
}
