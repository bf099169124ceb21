//! Integration tests for the inventory pipeline.
//!
//! Tests: Service → InventoryStore → InlineEventBus → StatusRecomputer
//!
//! Verifies:
//! - FIFO deduction drains the soonest-expiring stock and is all-or-nothing
//! - Item status is current as soon as a mutation returns
//! - Concurrent deductions never oversell

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, Utc};

    use fleetstock_core::{EmployeeId, ItemId, PrefixedId};
    use fleetstock_events::EventBus;
    use fleetstock_inventory::{
        BusCondition, ExternalSource, IntakeRequest, InventoryEvent, ItemFilter, ItemSort, ItemSortKey, ItemStatus,
        NewBus, NewItem, NewRequest, RequestFilter, RequestStatus, RequestType, SortDirection, StockPolicy,
    };

    use crate::catalogue::InitialStock;
    use crate::clock::FixedClock;
    use crate::config::LedgerConfig;
    use crate::error::InventoryError;
    use crate::services::InventoryServices;
    use crate::store::InMemoryInventoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    fn setup_on(day: NaiveDate, retries: u32) -> InventoryServices {
        InventoryServices::new(
            Arc::new(InMemoryInventoryStore::new()),
            Arc::new(FixedClock::on(day)),
            LedgerConfig {
                max_deduction_retries: retries,
            },
        )
    }

    fn setup() -> InventoryServices {
        setup_on(today(), 5)
    }

    async fn consumable_item(services: &InventoryServices, reorder_level: u32) -> ItemId {
        let category = match services.catalogue.list_categories().await.unwrap().into_iter().next() {
            Some(c) => c,
            None => services.catalogue.create_category("Consumable").await.unwrap(),
        };
        services
            .catalogue
            .create_item(
                NewItem {
                    name: "Brake pad".to_string(),
                    unit: "set".to_string(),
                    reorder_level,
                    category_id: category.id,
                    stock_policy: StockPolicy::BatchSum,
                },
                None,
            )
            .await
            .unwrap()
            .item
            .id
    }

    fn intake(item_id: ItemId, usable: u32, exp: Option<NaiveDate>) -> IntakeRequest {
        IntakeRequest {
            item_id,
            total_received: usable,
            usable,
            defective: 0,
            missing: 0,
            expiration_date: exp,
        }
    }

    fn request(item_id: ItemId, kind: RequestType, quantity: u32) -> NewRequest {
        NewRequest {
            requester: EmployeeId::parse("EMP-017").unwrap(),
            item_id,
            request_type: kind,
            quantity,
            purpose: "route 12 maintenance".to_string(),
            expected_return_date: None,
        }
    }

    async fn effective(services: &InventoryServices, item_id: ItemId) -> ItemStatus {
        services.catalogue.get_item(item_id).await.unwrap().effective_status
    }

    async fn usable_by_batch(services: &InventoryServices, item_id: ItemId) -> Vec<u32> {
        services
            .ledger
            .list_batches(item_id, false)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.batch.usable_quantity)
            .collect()
    }

    #[tokio::test]
    async fn deduction_drains_soonest_expiring_batches_first() {
        let services = setup();
        let item_id = consumable_item(&services, 2).await;
        services.ledger.intake(intake(item_id, 5, date(2025, 1, 1))).await.unwrap();
        services.ledger.intake(intake(item_id, 5, date(2025, 2, 1))).await.unwrap();
        services.ledger.intake(intake(item_id, 5, None)).await.unwrap();

        let outcome = services.ledger.deduct(item_id, 7).await.unwrap();

        assert_eq!(usable_by_batch(&services, item_id).await, vec![0, 3, 5]);
        assert_eq!(outcome.deductions.len(), 2);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(outcome.effective_status, Some(ItemStatus::Available));
        assert_eq!(services.catalogue.get_item(item_id).await.unwrap().current_stock, 8);
    }

    #[tokio::test]
    async fn shortfall_touches_no_batch() {
        let services = setup();
        let item_id = consumable_item(&services, 2).await;
        services.ledger.intake(intake(item_id, 4, date(2025, 1, 1))).await.unwrap();
        services.ledger.intake(intake(item_id, 2, None)).await.unwrap();

        let err = services.ledger.deduct(item_id, 10).await.unwrap_err();

        assert_eq!(
            err,
            InventoryError::InsufficientStock {
                requested: 10,
                available: 6
            }
        );
        assert_eq!(usable_by_batch(&services, item_id).await, vec![4, 2]);
    }

    #[tokio::test]
    async fn status_tracks_every_mutation() {
        let services = setup();
        let item_id = consumable_item(&services, 3).await;

        assert_eq!(effective(&services, item_id).await, ItemStatus::OutOfStock);

        services.ledger.intake(intake(item_id, 10, None)).await.unwrap();
        assert_eq!(effective(&services, item_id).await, ItemStatus::Available);

        services.ledger.deduct(item_id, 7).await.unwrap();
        assert_eq!(effective(&services, item_id).await, ItemStatus::LowStock);

        services.ledger.deduct(item_id, 3).await.unwrap();
        assert_eq!(effective(&services, item_id).await, ItemStatus::OutOfStock);
    }

    #[tokio::test]
    async fn borrow_then_return_does_not_restock() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 10, None)).await.unwrap();

        let borrow = services
            .requests
            .create(NewRequest {
                expected_return_date: today().succ_opt(),
                ..request(item_id, RequestType::Borrow, 4)
            })
            .await
            .unwrap();
        assert_eq!(borrow.status, RequestStatus::NotReturned);
        assert_eq!(borrow.id.to_string(), "REQ-00001");

        let consume = services.requests.create(request(item_id, RequestType::Consume, 1)).await.unwrap();
        assert_eq!(consume.status, RequestStatus::Consumed);
        assert_eq!(usable_by_batch(&services, item_id).await, vec![5]);

        let returned = services.requests.mark_returned(borrow.id, None).await.unwrap();
        assert_eq!(returned.status, RequestStatus::Returned);
        assert!(returned.actual_return_date.is_some());
        assert_eq!(usable_by_batch(&services, item_id).await, vec![5]);

        let again = services.requests.mark_returned(borrow.id, None).await.unwrap_err();
        assert!(matches!(again, InventoryError::InvalidTransition(_)));
        let consumed = services.requests.mark_returned(consume.id, None).await.unwrap_err();
        assert!(matches!(consumed, InventoryError::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn failed_deduction_creates_no_request() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 2, None)).await.unwrap();

        let err = services.requests.create(request(item_id, RequestType::Consume, 3)).await.unwrap_err();
        assert!(matches!(err, InventoryError::InsufficientStock { .. }));
        assert!(services.requests.list(&RequestFilter::default()).await.unwrap().is_empty());

        let err = services.requests.create(request(ItemId::from_seq(404), RequestType::Consume, 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_deduction() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 2, None)).await.unwrap();

        let err = services
            .requests
            .create(NewRequest {
                expected_return_date: today().pred_opt(),
                ..request(item_id, RequestType::Borrow, 1)
            })
            .await
            .unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert_eq!(usable_by_batch(&services, item_id).await, vec![2]);
    }

    #[tokio::test]
    async fn expired_batch_removal_rechecks_the_date() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        let expired = services.ledger.intake(intake(item_id, 3, date(2024, 11, 30))).await.unwrap();
        let fresh = services.ledger.intake(intake(item_id, 3, date(2025, 6, 1))).await.unwrap();
        assert_eq!(
            services.catalogue.get_item(item_id).await.unwrap().effective_status,
            ItemStatus::Expired
        );

        let err = services.ledger.remove_expired_batch(fresh.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotExpired(_)));

        services.ledger.remove_expired_batch(expired.id).await.unwrap();
        let view = services.catalogue.get_item(item_id).await.unwrap();
        assert_eq!(view.effective_status, ItemStatus::Available);
        assert_eq!(view.current_stock, 3);

        let err = services.ledger.remove_expired_batch(expired.id).await.unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));

        let all = services.ledger.list_batches(item_id, true).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].expired && all[0].batch.deleted);
    }

    #[tokio::test]
    async fn bulk_intake_reports_each_failure() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        let mut bad = intake(item_id, 5, None);
        bad.total_received = 6;

        let report = services
            .ledger
            .bulk_intake(vec![
                intake(item_id, 5, None),
                bad,
                intake(ItemId::from_seq(77), 1, None),
                intake(item_id, 2, None),
            ])
            .await;

        assert_eq!(report.succeeded.len(), 2);
        let failed: Vec<(usize, &str)> = report.failures.iter().map(|f| (f.index, f.code)).collect();
        assert_eq!(failed, vec![(1, "validation"), (2, "not_found")]);
        assert!(report.warning().unwrap().starts_with("2 of 4"));
        assert_eq!(services.catalogue.get_item(item_id).await.unwrap().current_stock, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deductions_never_oversell() {
        let services = setup_on(today(), 1_000);
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 6, date(2025, 1, 1))).await.unwrap();
        services.ledger.intake(intake(item_id, 4, None)).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..25 {
            let ledger = services.ledger.clone();
            tasks.push(tokio::spawn(async move { ledger.deduct(item_id, 1).await }));
        }

        let mut succeeded = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(InventoryError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(succeeded, 10);
        assert_eq!(usable_by_batch(&services, item_id).await, vec![0, 0]);
        assert_eq!(
            services.catalogue.get_item(item_id).await.unwrap().effective_status,
            ItemStatus::OutOfStock
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_returns_stamp_the_date_once() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 3, None)).await.unwrap();
        let borrow = services.requests.create(request(item_id, RequestType::Borrow, 1)).await.unwrap();

        let base = Utc::now();
        let mut tasks = Vec::new();
        for i in 0..8 {
            let requests = services.requests.clone();
            let at = base + Duration::seconds(i);
            tasks.push(tokio::spawn(async move { requests.mark_returned(borrow.id, Some(at)).await }));
        }

        let mut winners = Vec::new();
        for task in tasks {
            match task.await.unwrap() {
                Ok(returned) => winners.push(returned),
                Err(InventoryError::InvalidTransition(_)) => {}
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(winners.len(), 1);
        let stored = services.requests.get(borrow.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Returned);
        assert_eq!(stored.actual_return_date, winners[0].actual_return_date);
    }

    #[tokio::test]
    async fn externally_counted_items_cannot_be_deducted() {
        let services = setup();
        let category = services.catalogue.create_category("Equipment").await.unwrap();
        let fleet = services
            .catalogue
            .create_item(
                NewItem {
                    name: "Fleet bus".to_string(),
                    unit: "vehicle".to_string(),
                    reorder_level: 0,
                    category_id: category.id,
                    stock_policy: StockPolicy::ExternalCount(ExternalSource::FleetBuses),
                },
                None,
            )
            .await
            .unwrap()
            .item
            .id;
        for plate in ["KL-1001", "KL-1002", "KL-1003"] {
            services
                .catalogue
                .register_bus(NewBus {
                    plate_number: plate.to_string(),
                    item_id: Some(fleet),
                    condition: BusCondition::Operational,
                })
                .await
                .unwrap();
        }
        assert_eq!(services.catalogue.get_item(fleet).await.unwrap().current_stock, 3);

        let err = services.ledger.deduct(fleet, 1).await.unwrap_err();
        match err {
            InventoryError::Validation(msg) => assert!(msg.contains("counted externally")),
            other => panic!("expected validation error, got {other:?}"),
        }

        let err = services.requests.create(request(fleet, RequestType::Borrow, 1)).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(services.requests.list(&RequestFilter::default()).await.unwrap().is_empty());
        assert_eq!(services.catalogue.get_item(fleet).await.unwrap().current_stock, 3);
    }

    #[tokio::test]
    async fn manual_override_outlives_deductions() {
        let services = setup();
        let item_id = consumable_item(&services, 5).await;
        services.ledger.intake(intake(item_id, 20, None)).await.unwrap();

        services.catalogue.set_override(item_id, ItemStatus::UnderMaintenance).await.unwrap();
        services.ledger.deduct(item_id, 18).await.unwrap();

        let view = services.catalogue.get_item(item_id).await.unwrap();
        assert_eq!(view.effective_status, ItemStatus::UnderMaintenance);
        assert_eq!(view.item.status, ItemStatus::LowStock);

        let view = services.catalogue.clear_override(item_id).await.unwrap();
        assert_eq!(view.effective_status, ItemStatus::LowStock);

        let err = services.catalogue.set_override(item_id, ItemStatus::Expired).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
    }

    #[tokio::test]
    async fn initial_stock_is_checked_before_the_item_is_written() {
        let services = setup();
        let category = services.catalogue.create_category("Consumable").await.unwrap();
        let new = NewItem {
            name: "Coolant".to_string(),
            unit: "litre".to_string(),
            reorder_level: 4,
            category_id: category.id,
            stock_policy: StockPolicy::BatchSum,
        };

        let bad = InitialStock {
            total_received: 10,
            usable: 9,
            defective: 0,
            missing: 0,
            expiration_date: None,
        };
        let err = services.catalogue.create_item(new.clone(), Some(bad)).await.unwrap_err();
        assert!(matches!(err, InventoryError::Validation(_)));
        assert!(services.store.list_items(true).await.unwrap().is_empty());

        let good = InitialStock {
            total_received: 10,
            usable: 8,
            defective: 1,
            missing: 1,
            expiration_date: None,
        };
        let view = services.catalogue.create_item(new, Some(good)).await.unwrap();
        assert_eq!(view.item.id.to_string(), "ITEM-00001");
        assert_eq!(view.current_stock, 8);
        assert_eq!(view.effective_status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn deleted_item_hides_its_stock() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        services.ledger.intake(intake(item_id, 5, None)).await.unwrap();

        services.catalogue.delete_item(item_id).await.unwrap();

        assert!(matches!(
            services.ledger.deduct(item_id, 1).await,
            Err(InventoryError::NotFound(_))
        ));
        assert!(matches!(
            services.catalogue.get_item(item_id).await,
            Err(InventoryError::NotFound(_))
        ));
        assert!(
            services
                .catalogue
                .list_items(&ItemFilter::default(), ItemSort::default())
                .await
                .unwrap()
                .is_empty()
        );
        let history = services.ledger.list_batches(item_id, true).await.unwrap();
        assert!(history.iter().all(|b| b.batch.deleted));
    }

    #[tokio::test]
    async fn listing_filters_and_sorts_views() {
        let services = setup();
        let low = consumable_item(&services, 5).await;
        let plenty = consumable_item(&services, 5).await;
        services.ledger.intake(intake(low, 2, None)).await.unwrap();
        services.ledger.intake(intake(plenty, 50, None)).await.unwrap();

        let by_stock = services
            .catalogue
            .list_items(
                &ItemFilter::default(),
                ItemSort {
                    key: ItemSortKey::CurrentStock,
                    direction: SortDirection::Desc,
                },
            )
            .await
            .unwrap();
        let ids: Vec<ItemId> = by_stock.iter().map(|v| v.item.id).collect();
        assert_eq!(ids, vec![plenty, low]);

        let only_low = services
            .catalogue
            .list_items(
                &ItemFilter {
                    status: Some(ItemStatus::LowStock),
                    ..ItemFilter::default()
                },
                ItemSort::default(),
            )
            .await
            .unwrap();
        assert_eq!(only_low.len(), 1);
        assert_eq!(only_low[0].item.id, low);
    }

    #[tokio::test]
    async fn observers_see_batch_changes() {
        let services = setup();
        let item_id = consumable_item(&services, 0).await;
        let subscription = services.bus.subscribe();

        services.ledger.intake(intake(item_id, 5, date(2025, 1, 1))).await.unwrap();
        services.ledger.intake(intake(item_id, 5, None)).await.unwrap();
        services.ledger.deduct(item_id, 6).await.unwrap();

        let events = subscription.drain();
        let batch_events = events
            .iter()
            .filter(|e| matches!(e.payload(), InventoryEvent::BatchChanged(_)))
            .count();
        assert_eq!(batch_events, 4);
        assert!(events.iter().all(|e| e.subject_id() == item_id.to_string()));
        assert!(events.windows(2).all(|w| w[0].sequence_number() < w[1].sequence_number()));
    }
}
