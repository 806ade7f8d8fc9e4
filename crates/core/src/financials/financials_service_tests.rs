//! Tests for the financials service.

#[cfg(test)]
mod tests {
    use crate::errors::{DatabaseError, Error, Result, ValidationError};
    use crate::events::{DomainEvent, MockDomainEventSink};
    use crate::financials::{
        CapStatus, CommitTrigger, EscrowFinancialsRepositoryTrait, EscrowRecord, EscrowStatus,
        FieldUpdate, FinancialField, FinancialsService, FinancialsServiceTrait, NewEscrow,
        PersistAck, PersistenceGateway, SplitRule, StoredFinancials,
    };
    use crate::settings::{CommissionSettings, CommissionSettingsUpdate, SettingsServiceTrait};
    use async_trait::async_trait;
    use chrono::{NaiveDate, NaiveDateTime};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    // ==================== Mocks ====================

    #[derive(Default)]
    struct MockEscrowRepository {
        escrows: Mutex<HashMap<String, EscrowRecord>>,
        rules: Mutex<Vec<SplitRule>>,
        persisted: Mutex<Vec<FieldUpdate>>,
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    impl MockEscrowRepository {
        fn insert(&self, record: EscrowRecord) {
            self.escrows
                .lock()
                .unwrap()
                .insert(record.id.clone(), record);
        }

        fn add_rule(&self, rule: SplitRule) {
            self.rules.lock().unwrap().push(rule);
        }
    }

    #[async_trait]
    impl EscrowFinancialsRepositoryTrait for MockEscrowRepository {
        fn get_escrow(&self, escrow_id: &str) -> Result<EscrowRecord> {
            self.escrows
                .lock()
                .unwrap()
                .get(escrow_id)
                .cloned()
                .ok_or_else(|| DatabaseError::NotFound(escrow_id.to_string()).into())
        }

        async fn create_escrow(&self, new_escrow: NewEscrow) -> Result<EscrowRecord> {
            let record = EscrowRecord {
                id: new_escrow.id.unwrap_or_else(|| "generated".to_string()),
                display_id: new_escrow.display_id,
                property_address: new_escrow.property_address,
                escrow_status: EscrowStatus::Active,
                lead_source: new_escrow.lead_source,
                closing_date: new_escrow.closing_date,
                financials: new_escrow.financials,
                created_at: timestamp(),
                updated_at: timestamp(),
            };
            self.insert(record.clone());
            Ok(record)
        }

        async fn update_escrow_status(
            &self,
            escrow_id: &str,
            status: EscrowStatus,
            closing_date: Option<NaiveDate>,
        ) -> Result<EscrowRecord> {
            let mut escrows = self.escrows.lock().unwrap();
            let record = escrows
                .get_mut(escrow_id)
                .ok_or_else(|| Error::from(DatabaseError::NotFound(escrow_id.to_string())))?;
            record.escrow_status = status;
            if closing_date.is_some() {
                record.closing_date = closing_date;
            }
            Ok(record.clone())
        }

        fn list_closed_escrows(&self, year: i32) -> Result<Vec<EscrowRecord>> {
            use chrono::Datelike;
            Ok(self
                .escrows
                .lock()
                .unwrap()
                .values()
                .filter(|r| r.escrow_status == EscrowStatus::Closed)
                .filter(|r| r.closing_date.map(|d| d.year()) == Some(year))
                .cloned()
                .collect())
        }

        fn get_split_rules(&self, year: i32) -> Result<Vec<SplitRule>> {
            Ok(self
                .rules
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.effective_year == year)
                .cloned()
                .collect())
        }

        async fn save_split_rule(&self, rule: SplitRule) -> Result<SplitRule> {
            self.add_rule(rule.clone());
            Ok(rule)
        }
    }

    #[async_trait]
    impl PersistenceGateway for MockEscrowRepository {
        async fn persist(&self, update: FieldUpdate) -> Result<PersistAck> {
            self.persisted.lock().unwrap().push(update);
            Ok(PersistAck::accepted())
        }
    }

    struct MockSettingsService {
        settings: CommissionSettings,
    }

    #[async_trait]
    impl SettingsServiceTrait for MockSettingsService {
        fn get_commission_settings(&self) -> Result<CommissionSettings> {
            Ok(self.settings.clone())
        }

        async fn update_commission_settings(
            &self,
            _update: &CommissionSettingsUpdate,
        ) -> Result<()> {
            Ok(())
        }

        fn get_setting_value(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set_setting_value(&self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        repo: Arc<MockEscrowRepository>,
        sink: MockDomainEventSink,
        service: FinancialsService,
    }

    fn fixture(settings: CommissionSettings) -> Fixture {
        let repo = Arc::new(MockEscrowRepository::default());
        let sink = MockDomainEventSink::new();
        let service = FinancialsService::new(
            repo.clone(),
            repo.clone(),
            Arc::new(MockSettingsService { settings }),
            Arc::new(sink.clone()),
        );
        Fixture {
            repo,
            sink,
            service,
        }
    }

    fn escrow(id: &str, price: Decimal) -> EscrowRecord {
        EscrowRecord {
            id: id.to_string(),
            display_id: None,
            property_address: format!("{} Main St", id),
            escrow_status: EscrowStatus::Active,
            lead_source: None,
            closing_date: None,
            financials: StoredFinancials::new().with(FinancialField::PurchasePrice, price),
            created_at: timestamp(),
            updated_at: timestamp(),
        }
    }

    fn closed(id: &str, price: Decimal, date: NaiveDate) -> EscrowRecord {
        EscrowRecord {
            escrow_status: EscrowStatus::Closed,
            closing_date: Some(date),
            ..escrow(id, price)
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_snapshot_uses_configured_defaults() {
        let f = fixture(CommissionSettings {
            default_commission_rate: dec!(3),
            default_split_percentage: dec!(80),
            ..CommissionSettings::default()
        });
        f.repo.insert(escrow("esc-1", dec!(500000)));

        let snapshot = f.service.load_snapshot("esc-1").unwrap();
        assert_eq!(snapshot.commission_rate, dec!(3));
        assert_eq!(snapshot.gross_commission, dec!(15000.00));
        assert_eq!(snapshot.agent_commission, dec!(12000.00));
        assert_eq!(snapshot.agent_net, dec!(11465.00));
    }

    #[test]
    fn test_load_missing_escrow_is_not_found() {
        let f = fixture(CommissionSettings::default());
        assert!(matches!(
            f.service.load_snapshot("nope"),
            Err(Error::Database(DatabaseError::NotFound(_)))
        ));
    }

    #[test]
    fn test_breakdown_for_escrow() {
        let f = fixture(CommissionSettings::default());
        f.repo.insert(escrow("esc-1", dec!(400000)));

        let breakdown = f.service.get_breakdown("esc-1").unwrap();
        assert_eq!(breakdown.gross_commission, dec!(10000.00));
        assert_eq!(breakdown.brokerage_share, dec!(2500.00));
        assert_eq!(breakdown.agent_net, dec!(6965.00));
        assert_eq!(breakdown.effective_commission_rate, Some(dec!(2.5)));
        assert!(!breakdown.has_warnings());
    }

    // ==================== Editor Tests ====================

    #[tokio::test]
    async fn test_open_editor_wires_gateway_and_display() {
        let f = fixture(CommissionSettings {
            mask_commissions: true,
            ..CommissionSettings::default()
        });
        f.repo.insert(escrow("esc-1", dec!(500000)));

        let mut editor = f.service.open_editor("esc-1").unwrap();
        assert_eq!(editor.display_value(FinancialField::GrossCommission), "$**,***");

        editor.start_edit(FinancialField::ReferralFees).unwrap();
        editor.set_draft("1,000").unwrap();
        editor.commit(CommitTrigger::Submit).await.unwrap();

        let persisted = f.repo.persisted.lock().unwrap().clone();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].path, "financials.referralFees");
        assert_eq!(f.sink.events().len(), 1);
    }

    // ==================== YTD GCI & Split Tests ====================

    #[test]
    fn test_ytd_gci_sums_escrows_closed_in_year() {
        let f = fixture(CommissionSettings::default());
        f.repo.insert(closed("a", dec!(400000), date(2024, 3, 1)));
        f.repo.insert(closed("b", dec!(1000000), date(2024, 9, 30)));
        f.repo.insert(closed("c", dec!(800000), date(2023, 12, 31)));
        f.repo.insert(escrow("d", dec!(900000)));

        // 10,000 + 25,000
        assert_eq!(f.service.get_ytd_gci(2024).unwrap(), dec!(35000.00));
        assert_eq!(f.service.get_ytd_gci(2023).unwrap(), dec!(20000.00));
        assert_eq!(f.service.get_ytd_gci(2022).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_suggest_split_uses_ytd_gci_and_lead_source() {
        let f = fixture(CommissionSettings::default());
        f.repo.insert(closed("a", dec!(2400000), date(2024, 5, 1)));
        f.repo.insert(EscrowRecord {
            lead_source: Some("zillow".to_string()),
            ..escrow("new", dec!(500000))
        });
        f.repo.insert(escrow("walk-in", dec!(300000)));
        for (id, source, min, max, split) in [
            ("t1", "default", dec!(0), Some(dec!(50000)), dec!(70)),
            ("t2", "default", dec!(50000), Some(dec!(100000)), dec!(80)),
            ("z", "zillow", dec!(0), None, dec!(60)),
        ] {
            f.repo.add_rule(SplitRule {
                id: id.to_string(),
                lead_source: source.to_string(),
                effective_year: 2024,
                gci_threshold_min: min,
                gci_threshold_max: max,
                split_percentage: split,
                notes: None,
            });
        }

        // 2.4M at 2.5% = 60,000 YTD
        let decision = f.service.suggest_split("walk-in", 2024).unwrap();
        assert_eq!(decision.split_percentage, dec!(80));
        assert_eq!(decision.cap_status, CapStatus::MidTier);

        let decision = f.service.suggest_split("new", 2024).unwrap();
        assert_eq!(decision.split_percentage, dec!(60));

        let decision = f.service.suggest_split("walk-in", 2025).unwrap();
        assert_eq!(decision.split_percentage, dec!(70));
        assert!(decision.rule_id.is_none());
    }

    // ==================== Lifecycle Tests ====================

    #[tokio::test]
    async fn test_create_escrow_emits_event() {
        let f = fixture(CommissionSettings::default());
        let record = f
            .service
            .create_escrow(NewEscrow {
                id: Some("esc-9".to_string()),
                property_address: "9 Elm St".to_string(),
                ..NewEscrow::default()
            })
            .await
            .unwrap();

        assert_eq!(record.id, "esc-9");
        assert_eq!(f.sink.events(), vec![DomainEvent::escrow_created("esc-9")]);
    }

    #[tokio::test]
    async fn test_create_escrow_requires_address() {
        let f = fixture(CommissionSettings::default());
        let result = f.service.create_escrow(NewEscrow::default()).await;
        assert!(matches!(result, Err(Error::Validation(_))));
        assert!(f.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_create_escrow_rejects_out_of_range_financials() {
        let f = fixture(CommissionSettings::default());
        let escrow_with = |field, value| NewEscrow {
            id: Some("esc-9".to_string()),
            property_address: "9 Elm St".to_string(),
            financials: StoredFinancials::new().with(field, value),
            ..NewEscrow::default()
        };

        let result = f
            .service
            .create_escrow(escrow_with(FinancialField::CommissionRate, dec!(150)))
            .await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::PercentageOutOfRange {
                field: FinancialField::CommissionRate
            }))
        ));

        let result = f
            .service
            .create_escrow(escrow_with(FinancialField::PurchasePrice, dec!(-1)))
            .await;
        assert!(matches!(
            result,
            Err(Error::Validation(ValidationError::NegativeAmount {
                field: FinancialField::PurchasePrice
            }))
        ));

        assert!(f.repo.get_escrow("esc-9").is_err());
        assert!(f.sink.events().is_empty());
    }

    #[tokio::test]
    async fn test_create_escrow_normalizes_precision() {
        let f = fixture(CommissionSettings::default());
        let record = f
            .service
            .create_escrow(NewEscrow {
                property_address: "9 Elm St".to_string(),
                financials: StoredFinancials::new()
                    .with(FinancialField::ReferralFees, dec!(10.005)),
                ..NewEscrow::default()
            })
            .await
            .unwrap();
        assert_eq!(
            record.financials.get(FinancialField::ReferralFees),
            Some(dec!(10.01))
        );
    }

    #[tokio::test]
    async fn test_corrupt_stored_amount_does_not_break_loading() {
        let f = fixture(CommissionSettings::default());
        let mut record = closed("esc-1", Decimal::MAX, date(2024, 3, 1));
        record
            .financials
            .insert(FinancialField::CommissionRate, dec!(3));
        f.repo.insert(record);
        f.repo.insert(closed("esc-2", dec!(400000), date(2024, 4, 1)));

        let snapshot = f.service.load_snapshot("esc-1").unwrap();
        assert_eq!(snapshot.purchase_price, Decimal::ZERO);
        assert_eq!(snapshot.base_commission, Decimal::ZERO);
        assert!(f.service.open_editor("esc-1").is_ok());
        assert_eq!(f.service.get_ytd_gci(2024).unwrap(), dec!(10000.00));
    }

    #[tokio::test]
    async fn test_close_escrow_counts_toward_ytd_gci() {
        let f = fixture(CommissionSettings::default());
        f.repo.insert(escrow("esc-1", dec!(400000)));
        assert_eq!(f.service.get_ytd_gci(2024).unwrap(), Decimal::ZERO);

        let record = f
            .service
            .close_escrow("esc-1", date(2024, 6, 30))
            .await
            .unwrap();
        assert_eq!(record.escrow_status, EscrowStatus::Closed);
        assert_eq!(f.service.get_ytd_gci(2024).unwrap(), dec!(10000.00));
        assert_eq!(
            f.sink.events(),
            vec![DomainEvent::escrow_status_changed(
                "esc-1",
                EscrowStatus::Active,
                EscrowStatus::Closed
            )]
        );

        // Closing again does not emit a second status change.
        f.service
            .close_escrow("esc-1", date(2024, 7, 1))
            .await
            .unwrap();
        assert_eq!(f.sink.events().len(), 1);
    }
}
