//! Macro-generated test suite for `Repository<Subject>` contract validation.
//!
//! The `repository_contract_tests!` macro generates a test module that
//! validates any `Repository<Subject>` implementation against the contract:
//! operator semantics, AND-combination, sorting, paging, distinct values
//! and insert/delete.
//!
//! # Usage
//!
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//!
//! use storage_harness::*;
//! use sieve::storage::InMemoryRepository;
//!
//! repository_contract_tests!(InMemoryRepository::<Subject>::new());
//! ```

/// Generate a full `Repository<Subject>` conformance test suite.
///
/// `$factory` must evaluate to an empty repository implementing
/// `Repository<Subject> + 'static`. It is re-evaluated for each test.
#[macro_export]
macro_rules! repository_contract_tests {
    ($factory:expr) => {
        mod repository_contract_tests {
            use super::*;
            use sieve::core::field::FieldValue;
            use sieve::core::predicate::{Operator, Predicate, PredicateValue};
            use sieve::core::repository::Repository;
            use sieve::core::sort::{PageRequest, Sort, SortOrder};
            use std::sync::Arc;

            async fn loaded() -> impl Repository<Subject> {
                let repository = $factory;
                repository.insert_all(sample_subjects()).await.unwrap();
                repository
            }

            // ==================================================================
            // Insert & find
            // ==================================================================

            #[tokio::test]
            async fn test_find_empty_repository() {
                let repository = $factory;
                assert!(repository.find(&[]).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_insert_and_find_all() {
                let repository = loaded().await;
                let found = repository.find(&[]).await.unwrap();
                assert_eq!(ids(&found), vec![1, 2, 3, 4, 5]);
            }

            #[tokio::test]
            async fn test_insert_returns_entity() {
                let repository = $factory;
                let inserted = repository
                    .insert(sample_subjects().remove(0))
                    .await
                    .unwrap();
                assert_eq!(inserted.name, "A375");
            }

            // ==================================================================
            // Operators
            // ==================================================================

            #[tokio::test]
            async fn test_equals() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("name", Operator::Equals, string("MCF7"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![4]);
            }

            #[tokio::test]
            async fn test_not_equals() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("species", Operator::NotEquals, string("human"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![3]);
            }

            #[tokio::test]
            async fn test_in_and_not_in() {
                let repository = loaded().await;
                let found = repository
                    .find(&[list("id", vec![int(1), int(3), int(9)])])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![1, 3]);

                let not_in = Predicate::new(
                    "id",
                    Operator::NotIn,
                    PredicateValue::Raw(vec!["1".into(), "3".into()]),
                )
                .unwrap();
                let found = repository.find(&[not_in]).await.unwrap();
                assert_eq!(ids(&found), vec![2, 4, 5]);
            }

            #[tokio::test]
            async fn test_null_checks() {
                let repository = loaded().await;
                let found = repository.find(&[flag("notes", Operator::NotNull)]).await.unwrap();
                assert_eq!(ids(&found), vec![3]);

                let found = repository.find(&[flag("notes", Operator::IsNull)]).await.unwrap();
                assert_eq!(ids(&found), vec![1, 2, 4, 5]);
            }

            #[tokio::test]
            async fn test_boolean_checks() {
                let repository = loaded().await;
                let found = repository
                    .find(&[flag("study.active", Operator::IsFalse)])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![3, 4]);

                let found = repository
                    .find(&[flag("study.active", Operator::IsTrue)])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![1, 2, 5]);
            }

            #[tokio::test]
            async fn test_comparisons() {
                let repository = loaded().await;
                let gt = repository
                    .find(&[single("id", Operator::GreaterThan, int(3))])
                    .await
                    .unwrap();
                assert_eq!(ids(&gt), vec![4, 5]);

                let lte = repository
                    .find(&[single("id", Operator::LessThanEquals, int(2))])
                    .await
                    .unwrap();
                assert_eq!(ids(&lte), vec![1, 2]);
            }

            #[tokio::test]
            async fn test_between_variants_differ_at_upper_bound() {
                let repository = loaded().await;
                let half_open = repository
                    .find(&[pair("id", Operator::Between, int(2), int(4))])
                    .await
                    .unwrap();
                assert_eq!(ids(&half_open), vec![2, 3]);

                let inclusive = repository
                    .find(&[pair("id", Operator::BetweenInclusive, int(2), int(4))])
                    .await
                    .unwrap();
                assert_eq!(ids(&inclusive), vec![2, 3, 4]);
            }

            #[tokio::test]
            async fn test_outside_variants() {
                let repository = loaded().await;
                let outside = repository
                    .find(&[pair("id", Operator::Outside, int(2), int(4))])
                    .await
                    .unwrap();
                assert_eq!(ids(&outside), vec![1, 4, 5]);

                let outside_inclusive = repository
                    .find(&[pair("id", Operator::OutsideInclusive, int(2), int(4))])
                    .await
                    .unwrap();
                assert_eq!(ids(&outside_inclusive), vec![1, 2, 4, 5]);
            }

            #[tokio::test]
            async fn test_string_prefix_and_suffix() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("name", Operator::StartsWith, string("T4"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![5]);

                let found = repository
                    .find(&[single("name", Operator::EndsWith, string("a"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![2]);
            }

            #[tokio::test]
            async fn test_container_matches_any_element() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("aliases", Operator::Equals, string("Hela-S3"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![2]);

                let found = repository
                    .find(&[single("aliases", Operator::NotEquals, string("HELA"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![1, 3, 4, 5]);
            }

            #[tokio::test]
            async fn test_nested_path() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("study.name", Operator::Equals, string("CCLE"))])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![3, 4]);
            }

            #[tokio::test]
            async fn test_predicates_combine_with_and() {
                let repository = loaded().await;
                let found = repository
                    .find(&[
                        single("species", Operator::Equals, string("human")),
                        single("study.name", Operator::Equals, string("TCGA")),
                        single("id", Operator::GreaterThan, int(1)),
                    ])
                    .await
                    .unwrap();
                assert_eq!(ids(&found), vec![2, 5]);
            }

            #[tokio::test]
            async fn test_unknown_field_matches_nothing() {
                let repository = loaded().await;
                let found = repository
                    .find(&[single("nope", Operator::Equals, string("x"))])
                    .await
                    .unwrap();
                assert!(found.is_empty());
            }

            // ==================================================================
            // Sorting & paging
            // ==================================================================

            #[tokio::test]
            async fn test_find_sorted_desc() {
                let repository = loaded().await;
                let sort = Sort::by([SortOrder::desc("id")]);
                let found = repository.find_sorted(&[], &sort).await.unwrap();
                assert_eq!(ids(&found), vec![5, 4, 3, 2, 1]);
            }

            #[tokio::test]
            async fn test_find_sorted_by_two_keys() {
                let repository = loaded().await;
                let sort = Sort::by([SortOrder::asc("species"), SortOrder::desc("name")]);
                let found = repository.find_sorted(&[], &sort).await.unwrap();
                assert_eq!(ids(&found), vec![5, 4, 2, 1, 3]);
            }

            #[tokio::test]
            async fn test_find_paged_second_page() {
                let repository = loaded().await;
                let request = PageRequest::new(1, 3).with_sort(Sort::by([SortOrder::asc("id")]));
                let page = repository.find_paged(&[], &request).await.unwrap();
                assert_eq!(ids(&page.content), vec![4, 5]);
                assert_eq!(page.number, 1);
                assert_eq!(page.size, 3);
                assert_eq!(page.total_elements, 5);
                assert_eq!(page.total_pages, 2);
            }

            #[tokio::test]
            async fn test_find_paged_past_the_end() {
                let repository = loaded().await;
                let page = repository
                    .find_paged(&[], &PageRequest::new(4, 3))
                    .await
                    .unwrap();
                assert!(page.content.is_empty());
                assert_eq!(page.total_elements, 5);
                assert_eq!(page.total_pages, 2);
            }

            #[tokio::test]
            async fn test_find_paged_counts_filtered_total() {
                let repository = loaded().await;
                let page = repository
                    .find_paged(
                        &[single("species", Operator::Equals, string("human"))],
                        &PageRequest::new(0, 2),
                    )
                    .await
                    .unwrap();
                assert_eq!(ids(&page.content), vec![1, 2]);
                assert_eq!(page.total_elements, 4);
                assert_eq!(page.total_pages, 2);
            }

            // ==================================================================
            // Distinct, count, delete
            // ==================================================================

            #[tokio::test]
            async fn test_find_distinct() {
                let repository = loaded().await;
                let values = repository.find_distinct("species", &[]).await.unwrap();
                assert_eq!(values, vec![string("human"), string("mouse")]);

                let values = repository
                    .find_distinct("study.name", &[single("id", Operator::LessThan, int(3))])
                    .await
                    .unwrap();
                assert_eq!(values, vec![FieldValue::String("TCGA".into())]);
            }

            #[tokio::test]
            async fn test_count() {
                let repository = loaded().await;
                let count = repository
                    .count(&[single("species", Operator::Equals, string("human"))])
                    .await
                    .unwrap();
                assert_eq!(count, 4);
            }

            #[tokio::test]
            async fn test_delete_all() {
                let repository = loaded().await;
                repository.delete_all().await.unwrap();
                assert!(repository.find(&[]).await.unwrap().is_empty());
            }

            #[tokio::test]
            async fn test_concurrent_inserts() {
                let repository = Arc::new($factory);
                let mut handles = Vec::new();
                for subject in sample_subjects() {
                    let repository = repository.clone();
                    handles.push(tokio::spawn(async move {
                        repository.insert(subject).await.unwrap();
                    }));
                }
                for handle in handles {
                    handle.await.unwrap();
                }
                assert_count(&repository.find(&[]).await.unwrap(), 5);
            }
        }
    };
}
