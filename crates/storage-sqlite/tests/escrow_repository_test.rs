//! Integration tests for the SQLite escrow and settings repositories.

use std::sync::Arc;

use chrono::NaiveDate;
use escrowdesk_core::events::MockDomainEventSink;
use escrowdesk_core::financials::{
    CommitTrigger, EscrowFinancialsRepositoryTrait, EscrowStatus, FieldUpdate, FinancialField,
    FinancialsService, FinancialsServiceTrait, NewEscrow, PersistenceGateway, SplitRule,
    StoredFinancials,
};
use escrowdesk_core::settings::{
    CommissionSettingsUpdate, SettingsRepositoryTrait, SettingsService, SettingsServiceTrait,
};
use escrowdesk_core::errors::{DatabaseError, Error};
use escrowdesk_storage_sqlite::{
    create_pool, run_migrations, spawn_writer, EscrowFinancialsRepository, SettingsRepository,
};
use rust_decimal_macros::dec;
use tempfile::TempDir;

struct TestDb {
    _dir: TempDir,
    escrows: Arc<EscrowFinancialsRepository>,
    settings: Arc<SettingsRepository>,
}

fn setup() -> TestDb {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let pool = create_pool(db_path.to_str().unwrap()).unwrap();
    run_migrations(&pool).unwrap();
    let writer = spawn_writer((*pool).clone());

    TestDb {
        escrows: Arc::new(EscrowFinancialsRepository::new(pool.clone(), writer.clone())),
        settings: Arc::new(SettingsRepository::new(pool, writer)),
        _dir: dir,
    }
}

fn new_escrow(id: &str, price: rust_decimal::Decimal) -> NewEscrow {
    NewEscrow {
        id: Some(id.to_string()),
        property_address: format!("{} Harbor Way", id),
        financials: StoredFinancials::new().with(FinancialField::PurchasePrice, price),
        ..NewEscrow::default()
    }
}

#[tokio::test]
async fn test_create_and_get_escrow() {
    let db = setup();
    let created = db
        .escrows
        .create_escrow(new_escrow("esc-1", dec!(500000)))
        .await
        .unwrap();
    assert_eq!(created.escrow_status, EscrowStatus::Active);

    let loaded = db.escrows.get_escrow("esc-1").unwrap();
    assert_eq!(loaded.property_address, "esc-1 Harbor Way");
    assert_eq!(
        loaded.financials.get(FinancialField::PurchasePrice),
        Some(dec!(500000))
    );
}

#[tokio::test]
async fn test_missing_escrow_is_not_found() {
    let db = setup();
    assert!(matches!(
        db.escrows.get_escrow("missing"),
        Err(Error::Database(DatabaseError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_persist_writes_only_the_changed_field() {
    let db = setup();
    db.escrows
        .create_escrow(new_escrow("esc-1", dec!(500000)))
        .await
        .unwrap();

    let ack = db
        .escrows
        .persist(FieldUpdate::new("esc-1", FinancialField::TcFee, dec!(300)))
        .await
        .unwrap();
    assert!(ack.server_snapshot.is_none());

    let stored = db.escrows.get_escrow("esc-1").unwrap().financials;
    assert_eq!(stored.get(FinancialField::TcFee), Some(dec!(300)));
    assert_eq!(stored.get(FinancialField::PurchasePrice), Some(dec!(500000)));
    assert_eq!(stored.get(FinancialField::DealNet), None);
}

#[tokio::test]
async fn test_persist_to_missing_escrow_fails() {
    let db = setup();
    let result = db
        .escrows
        .persist(FieldUpdate::new("ghost", FinancialField::TcFee, dec!(300)))
        .await;
    assert!(matches!(
        result,
        Err(Error::Database(DatabaseError::NotFound(_)))
    ));
}

#[tokio::test]
async fn test_closed_escrows_filtered_by_year() {
    let db = setup();
    for id in ["a", "b", "c"] {
        db.escrows
            .create_escrow(new_escrow(id, dec!(100000)))
            .await
            .unwrap();
    }
    db.escrows
        .update_escrow_status(
            "a",
            EscrowStatus::Closed,
            NaiveDate::from_ymd_opt(2024, 2, 1),
        )
        .await
        .unwrap();
    db.escrows
        .update_escrow_status(
            "b",
            EscrowStatus::Closed,
            NaiveDate::from_ymd_opt(2023, 12, 31),
        )
        .await
        .unwrap();

    let closed_2024 = db.escrows.list_closed_escrows(2024).unwrap();
    assert_eq!(closed_2024.len(), 1);
    assert_eq!(closed_2024[0].id, "a");
    assert_eq!(db.escrows.list_closed_escrows(2023).unwrap().len(), 1);
}

#[tokio::test]
async fn test_split_rules_round_trip() {
    let db = setup();
    let rule = SplitRule {
        id: "tier-2".to_string(),
        lead_source: "default".to_string(),
        effective_year: 2024,
        gci_threshold_min: dec!(50000),
        gci_threshold_max: Some(dec!(100000)),
        split_percentage: dec!(80),
        notes: Some("Mid tier".to_string()),
    };
    db.escrows.save_split_rule(rule.clone()).await.unwrap();

    let updated = SplitRule {
        split_percentage: dec!(82.5),
        ..rule.clone()
    };
    db.escrows.save_split_rule(updated).await.unwrap();

    let rules = db.escrows.get_split_rules(2024).unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].split_percentage, dec!(82.5));
    assert_eq!(rules[0].gci_threshold_max, Some(dec!(100000)));
    assert!(db.escrows.get_split_rules(2025).unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_seeded_and_updatable() {
    let db = setup();
    let service = SettingsService::new(db.settings.clone());

    let settings = service.get_commission_settings().unwrap();
    assert_eq!(settings.default_commission_rate, dec!(2.5));
    assert_eq!(settings.default_tc_fee, dec!(250));

    service
        .update_commission_settings(&CommissionSettingsUpdate {
            default_tc_fee: Some(dec!(395)),
            mask_commissions: Some(true),
            ..Default::default()
        })
        .await
        .unwrap();

    let settings = service.get_commission_settings().unwrap();
    assert_eq!(settings.default_tc_fee, dec!(395));
    assert!(settings.mask_commissions);
    assert_eq!(db.settings.get_setting("default_tc_fee").unwrap(), "395");
}

#[tokio::test]
async fn test_edit_persists_and_reloads_through_service() {
    let db = setup();
    let settings_service = Arc::new(SettingsService::new(db.settings.clone()));
    let sink = MockDomainEventSink::new();
    let service = FinancialsService::new(
        db.escrows.clone(),
        db.escrows.clone(),
        settings_service,
        Arc::new(sink.clone()),
    );

    service
        .create_escrow(new_escrow("esc-1", dec!(500000)))
        .await
        .unwrap();

    let mut editor = service.open_editor("esc-1").unwrap();
    assert_eq!(editor.value(FinancialField::GrossCommission), dec!(12500.00));

    editor.start_edit(FinancialField::CommissionRate).unwrap();
    editor.set_draft("3%").unwrap();
    editor.commit(CommitTrigger::Submit).await.unwrap();
    assert_eq!(editor.value(FinancialField::GrossCommission), dec!(15000.00));

    // Only the edited input was stored; derived values are computed on load.
    let reloaded = service.load_snapshot("esc-1").unwrap();
    assert_eq!(reloaded.commission_rate, dec!(3));
    assert_eq!(reloaded.gross_commission, dec!(15000.00));
    assert_eq!(reloaded.agent_net, dec!(10715.00));
    assert_eq!(sink.events().len(), 2);
}

#[tokio::test]
async fn test_ancestor_edit_after_reload_replaces_stored_override() {
    let db = setup();
    let settings_service = Arc::new(SettingsService::new(db.settings.clone()));
    let service = FinancialsService::new(
        db.escrows.clone(),
        db.escrows.clone(),
        settings_service,
        Arc::new(MockDomainEventSink::new()),
    );
    service
        .create_escrow(new_escrow("esc-1", dec!(500000)))
        .await
        .unwrap();

    let mut editor = service.open_editor("esc-1").unwrap();
    editor.start_edit(FinancialField::GrossCommission).unwrap();
    editor.set_draft("16000").unwrap();
    editor.commit(CommitTrigger::Submit).await.unwrap();
    assert_eq!(editor.value(FinancialField::AgentNet), dec!(11465.00));

    // The pinned value is stored; the pin itself is not.
    let mut editor = service.open_editor("esc-1").unwrap();
    assert!(!editor.is_overridden(FinancialField::GrossCommission));
    assert_eq!(editor.value(FinancialField::GrossCommission), dec!(16000));
    assert_eq!(editor.value(FinancialField::AgentNet), dec!(11465.00));

    editor.start_edit(FinancialField::CommissionRate).unwrap();
    editor.set_draft("3").unwrap();
    editor.commit(CommitTrigger::Submit).await.unwrap();
    let shown = editor.snapshot().clone();
    assert_eq!(shown.gross_commission, dec!(15000.00));
    assert_eq!(shown.agent_net, dec!(10715.00));

    let reloaded = service.load_snapshot("esc-1").unwrap();
    assert_eq!(reloaded, shown);

    let stored = db.escrows.get_escrow("esc-1").unwrap().financials;
    assert_eq!(stored.get(FinancialField::GrossCommission), None);
    assert_eq!(stored.get(FinancialField::CommissionRate), Some(dec!(3)));
}
