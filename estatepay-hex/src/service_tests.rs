//! PaymentService unit tests.
//!
//! The mock ledger reproduces the adapter's reconciliation semantics
//! (terminal short-circuit, grant insertion, paid recomputation) in memory,
//! so the full state machine is exercised without a database.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{Months, NaiveDate, Utc};
    use uuid::Uuid;

    use estatepay_types::{
        Account, AccountId, AppError, Currency, LedgerError, ListingCategory, Money,
        NewPayment, PaymentGateway, PaymentLedger, PaymentOutcome, PaymentSession, Property,
        PropertyGrant, PropertyId, ProviderStatus, ProviderVerification, RateSnapshot,
        Reconciliation, SessionRequest, Transaction, TransactionId, TransactionStatus,
        WebhookDisposition, dto::InitializePaymentRequest, domain::Role, grant_window,
        ports::GatewayError,
    };

    use crate::PaymentService;

    pub(crate) const WEBHOOK_SECRET: &str = "sk_test_webhook_secret";

    // ─────────────────────────────────────────────────────────────────────────
    // Mock ledger
    // ─────────────────────────────────────────────────────────────────────────

    /// In-memory ledger reproducing the Postgres adapter's semantics.
    pub(crate) struct MockLedger {
        accounts: Mutex<HashMap<AccountId, Account>>,
        properties: Mutex<HashMap<PropertyId, Property>>,
        transactions: Mutex<Vec<Transaction>>,
        grants: Mutex<Vec<PropertyGrant>>,
        rates: Mutex<Option<RateSnapshot>>,
    }

    impl MockLedger {
        pub(crate) fn new() -> Self {
            Self {
                accounts: Mutex::new(HashMap::new()),
                properties: Mutex::new(HashMap::new()),
                transactions: Mutex::new(Vec::new()),
                grants: Mutex::new(Vec::new()),
                rates: Mutex::new(None),
            }
        }

        pub(crate) fn add_account(&self) -> Account {
            let account = Account::from_parts(
                AccountId::new(),
                "payer@example.com".to_string(),
                Role::Customer,
                Utc::now(),
            );
            self.accounts
                .lock()
                .unwrap()
                .insert(account.id, account.clone());
            account
        }

        pub(crate) fn add_property(&self, total_price: i64, inspection_fee: i64) -> Property {
            let property = Property::from_parts(
                PropertyId::new(),
                AccountId::new(),
                "3-bed duplex, Lekki".to_string(),
                total_price,
                total_price,
                inspection_fee,
                false,
                false,
                ListingCategory::Rent,
                "house".to_string(),
                Utc::now(),
            );
            self.properties
                .lock()
                .unwrap()
                .insert(property.id, property.clone());
            property
        }

        pub(crate) fn set_rates(&self, usd: f64, eur: f64, gbp: f64) {
            *self.rates.lock().unwrap() = Some(RateSnapshot {
                id: Uuid::new_v4(),
                usd,
                eur,
                gbp,
                last_updated: Utc::now().date_naive(),
            });
        }

        pub(crate) fn grant_count(&self) -> usize {
            self.grants.lock().unwrap().len()
        }

        pub(crate) fn property_state(&self, id: PropertyId) -> Property {
            self.properties.lock().unwrap()[&id].clone()
        }

        pub(crate) fn stored_transaction(&self, reference: &str) -> Transaction {
            self.transactions
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.reference == reference)
                .cloned()
                .unwrap()
        }
    }

    #[async_trait]
    impl PaymentLedger for MockLedger {
        async fn get_account(&self, id: AccountId) -> Result<Option<Account>, LedgerError> {
            Ok(self.accounts.lock().unwrap().get(&id).cloned())
        }

        async fn get_property(&self, id: PropertyId) -> Result<Option<Property>, LedgerError> {
            Ok(self.properties.lock().unwrap().get(&id).cloned())
        }

        async fn has_qualifying_success(
            &self,
            property_id: PropertyId,
        ) -> Result<bool, LedgerError> {
            Ok(self.transactions.lock().unwrap().iter().any(|t| {
                t.property_id == property_id
                    && t.status == TransactionStatus::Success
                    && t.purpose.grants_access()
            }))
        }

        async fn create_pending(&self, new: NewPayment) -> Result<Transaction, LedgerError> {
            if !self.properties.lock().unwrap().contains_key(&new.property_id) {
                return Err(LedgerError::NotFound);
            }
            if !self.accounts.lock().unwrap().contains_key(&new.account_id) {
                return Err(LedgerError::NotFound);
            }
            if new.purpose.grants_access() && self.has_qualifying_success(new.property_id).await? {
                return Err(LedgerError::DuplicatePayment);
            }

            let mut transactions = self.transactions.lock().unwrap();
            if transactions.iter().any(|t| t.reference == new.reference) {
                return Err(LedgerError::Conflict("duplicate reference".into()));
            }

            let now = Utc::now();
            let tx = Transaction::from_parts(
                TransactionId::new(),
                new.reference,
                new.property_id,
                new.account_id,
                new.purpose,
                Money::new(new.amount, Currency::BASE).map_err(LedgerError::Domain)?,
                new.display_currency,
                new.commission,
                TransactionStatus::Pending,
                new.term,
                new.start_date,
                now,
                now,
            );
            transactions.push(tx.clone());
            Ok(tx)
        }

        async fn find_by_reference(
            &self,
            reference: &str,
        ) -> Result<Option<Transaction>, LedgerError> {
            Ok(self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .find(|t| t.reference == reference)
                .cloned())
        }

        async fn apply_outcome(
            &self,
            reference: &str,
            outcome: PaymentOutcome,
        ) -> Result<Reconciliation, LedgerError> {
            let mut transactions = self.transactions.lock().unwrap();
            let index = transactions
                .iter()
                .position(|t| t.reference == reference)
                .ok_or(LedgerError::NotFound)?;

            if transactions[index].is_terminal() {
                let transaction = transactions[index].clone();
                let grant = self
                    .grants
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|g| g.transaction_id == transaction.id)
                    .cloned();
                return Ok(Reconciliation {
                    transaction,
                    grant,
                    newly_applied: false,
                });
            }

            let now = Utc::now();
            transactions[index].status = outcome.terminal_status();
            transactions[index].updated_at = now;
            let transaction = transactions[index].clone();

            let mut grant = None;
            match outcome {
                PaymentOutcome::Success if transaction.purpose.grants_access() => {
                    let (start, end) = grant_window(
                        transaction.purpose,
                        transaction.term,
                        transaction.start_date,
                    )
                    .unwrap();
                    let g = PropertyGrant {
                        id: Uuid::new_v4(),
                        transaction_id: transaction.id,
                        property_id: transaction.property_id,
                        account_id: transaction.account_id,
                        amount: transaction.amount.amount(),
                        duration_months: transaction.term.months,
                        duration_days: transaction.term.days,
                        start_date: start,
                        end_date: end,
                        expired: false,
                        created_at: now,
                    };
                    self.grants.lock().unwrap().push(g.clone());
                    let mut properties = self.properties.lock().unwrap();
                    if let Some(p) = properties.get_mut(&transaction.property_id) {
                        p.paid = true;
                        p.publicized = true;
                    }
                    grant = Some(g);
                }
                PaymentOutcome::Success => {}
                PaymentOutcome::Failed => {
                    let paid = transactions.iter().any(|t| {
                        t.property_id == transaction.property_id
                            && t.status == TransactionStatus::Success
                            && t.purpose.grants_access()
                    });
                    let mut properties = self.properties.lock().unwrap();
                    if let Some(p) = properties.get_mut(&transaction.property_id) {
                        p.paid = paid;
                    }
                }
            }

            Ok(Reconciliation {
                transaction,
                grant,
                newly_applied: true,
            })
        }

        async fn find_grant_for_transaction(
            &self,
            transaction_id: TransactionId,
        ) -> Result<Option<PropertyGrant>, LedgerError> {
            Ok(self
                .grants
                .lock()
                .unwrap()
                .iter()
                .find(|g| g.transaction_id == transaction_id)
                .cloned())
        }

        async fn list_for_account(
            &self,
            account_id: AccountId,
            page: u32,
            per_page: u32,
        ) -> Result<(Vec<Transaction>, i64), LedgerError> {
            let mut matching: Vec<Transaction> = self
                .transactions
                .lock()
                .unwrap()
                .iter()
                .filter(|t| t.account_id == account_id)
                .cloned()
                .collect();
            matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));

            let total = matching.len() as i64;
            let start = ((page.max(1) - 1) * per_page) as usize;
            let items = matching
                .into_iter()
                .skip(start)
                .take(per_page as usize)
                .collect();
            Ok((items, total))
        }

        async fn current_rates(&self) -> Result<Option<RateSnapshot>, LedgerError> {
            Ok(self.rates.lock().unwrap().clone())
        }

        async fn refresh_rates(
            &self,
            usd: f64,
            eur: f64,
            gbp: f64,
            date: NaiveDate,
        ) -> Result<RateSnapshot, LedgerError> {
            let snapshot = RateSnapshot {
                id: Uuid::new_v4(),
                usd,
                eur,
                gbp,
                last_updated: date,
            };
            *self.rates.lock().unwrap() = Some(snapshot.clone());
            Ok(snapshot)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mock gateway
    // ─────────────────────────────────────────────────────────────────────────

    /// Scriptable gateway that counts provider calls.
    pub(crate) struct MockGateway {
        init_calls: AtomicUsize,
        verify_calls: AtomicUsize,
        verify_status: Mutex<ProviderStatus>,
        initialize_unreachable: AtomicBool,
        verify_unreachable: AtomicBool,
    }

    impl MockGateway {
        pub(crate) fn new() -> Self {
            Self {
                init_calls: AtomicUsize::new(0),
                verify_calls: AtomicUsize::new(0),
                verify_status: Mutex::new(ProviderStatus::Success),
                initialize_unreachable: AtomicBool::new(false),
                verify_unreachable: AtomicBool::new(false),
            }
        }

        pub(crate) fn set_verify_status(&self, status: ProviderStatus) {
            *self.verify_status.lock().unwrap() = status;
        }

        pub(crate) fn set_verify_unreachable(&self, unreachable: bool) {
            self.verify_unreachable.store(unreachable, Ordering::SeqCst);
        }

        pub(crate) fn set_initialize_unreachable(&self, unreachable: bool) {
            self.initialize_unreachable
                .store(unreachable, Ordering::SeqCst);
        }

        pub(crate) fn verify_calls(&self) -> usize {
            self.verify_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn initialize_session(
            &self,
            request: SessionRequest,
        ) -> Result<PaymentSession, GatewayError> {
            if self.initialize_unreachable.load(Ordering::SeqCst) {
                return Err(GatewayError::Unreachable("connection refused".into()));
            }
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PaymentSession {
                authorization_url: format!("https://checkout.test/{}", request.reference),
                access_code: "AC_test".to_string(),
            })
        }

        async fn verify_by_reference(
            &self,
            _reference: &str,
        ) -> Result<ProviderVerification, GatewayError> {
            if self.verify_unreachable.load(Ordering::SeqCst) {
                return Err(GatewayError::Unreachable("connection refused".into()));
            }
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            let status = *self.verify_status.lock().unwrap();
            Ok(ProviderVerification {
                status,
                raw: serde_json::json!({ "status": "scripted" }),
            })
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn service() -> PaymentService<MockLedger, MockGateway> {
        PaymentService::new(
            MockLedger::new(),
            MockGateway::new(),
            WEBHOOK_SECRET,
            "https://estatepay.test",
        )
    }

    fn init_request(
        property: &Property,
        account: &Account,
        purpose: &str,
    ) -> InitializePaymentRequest {
        InitializePaymentRequest {
            property_id: property.id.to_string(),
            account_id: account.id.to_string(),
            purpose: purpose.to_string(),
            currency: "NGN".to_string(),
            duration_months: 12,
            duration_days: 1,
            start_date: None,
        }
    }

    pub(crate) fn signed_event(event: &str, reference: &str, secret: &str) -> (Vec<u8>, String) {
        let body = serde_json::json!({ "event": event, "data": { "reference": reference } })
            .to_string()
            .into_bytes();
        let signature = estatepay_repo::signature::sign_webhook(&body, secret);
        (body, signature)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initialization
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_initialize_rent_happy_path() {
        let service = service();
        let account = service.ledger().add_account();
        // ₦1,200.00 asking price
        let property = service.ledger().add_property(120_000, 5_000);

        let response = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        assert!(response.reference.starts_with("REF-"));
        assert_eq!(response.base_amount, 120_000);
        assert_eq!(response.amount, 120_000);
        assert_eq!(response.currency, Currency::NGN);
        assert_eq!(response.duration_months, 12);
        assert!(response.payment_link.contains(&response.reference));
        assert_eq!(
            response.end_date.unwrap(),
            response.start_date.checked_add_months(Months::new(12)).unwrap()
        );

        let stored = service.ledger().stored_transaction(&response.reference);
        assert_eq!(stored.status, TransactionStatus::Pending);
        // 2.5% of ₦1,200.00 is ₦30.00
        assert_eq!(stored.commission, 3_000);
    }

    #[tokio::test]
    async fn test_initialize_converts_display_amount() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);
        service.ledger().set_rates(0.00065, 0.00060, 0.00051);

        let mut request = init_request(&property, &account, "rent");
        request.currency = "USD".to_string();

        let response = service.initialize_payment(request).await.unwrap();

        assert_eq!(response.amount, 78); // 120000 kobo * 0.00065
        assert_eq!(response.currency, Currency::USD);
        assert_eq!(response.base_amount, 120_000);
        assert_eq!(response.base_currency, Currency::NGN);
    }

    #[tokio::test]
    async fn test_initialize_foreign_currency_without_rates_fails() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let mut request = init_request(&property, &account, "rent");
        request.currency = "USD".to_string();

        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::RatesUnavailable)));

        // The base currency needs no snapshot at all
        let result = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_initialize_rejects_unsupported_purpose() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let result = service
            .initialize_payment(init_request(&property, &account, "mortgage"))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_invalid_currency() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let mut request = init_request(&property, &account, "rent");
        request.currency = "JPY".to_string();

        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_property() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);
        let mut request = init_request(&property, &account, "rent");
        request.property_id = PropertyId::new().to_string();

        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_malformed_property_id() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let mut request = init_request(&property, &account, "rent");
        request.property_id = "not-a-uuid".to_string();
        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));

        // A missing propertyId deserializes to an empty string
        let mut request = init_request(&property, &account, "rent");
        request.property_id = String::new();
        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_unknown_account() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);
        let mut request = init_request(&property, &account, "rent");
        request.account_id = AccountId::new().to_string();

        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_inspection_without_fee() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let result = service
            .initialize_payment(init_request(&property, &account, "inspection_fee"))
            .await;

        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_initialize_rejects_zero_rent_duration() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let mut request = init_request(&property, &account, "rent");
        request.duration_months = 0;

        let result = service.initialize_payment(request).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_initialize_provider_unreachable_records_nothing() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);
        service.gateway().set_initialize_unreachable(true);

        let result = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await;

        assert!(matches!(result, Err(AppError::Provider(_))));
        assert!(
            service
                .ledger()
                .list_for_account(account.id, 1, 10)
                .await
                .unwrap()
                .0
                .is_empty()
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Duplicate-payment guard
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_duplicate_payment_guard() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 5_000);

        let first = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();
        service.verify_payment(&first.reference).await.unwrap();

        // A second non-inspection payment is a state conflict
        let result = service
            .initialize_payment(init_request(&property, &account, "sale"))
            .await;
        assert!(matches!(result, Err(AppError::DuplicatePayment)));

        // Inspection fees are still allowed
        let result = service
            .initialize_payment(init_request(&property, &account, "inspection_fee"))
            .await;
        assert!(result.is_ok());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Verification
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_verify_rent_happy_path() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        let response = service.verify_payment(&init.reference).await.unwrap();

        assert_eq!(response.status, TransactionStatus::Success);
        assert_eq!(response.amount, 120_000);
        let grant = response.grant.unwrap();
        assert_eq!(grant.duration_months, 12);
        assert_eq!(
            grant.end_date,
            grant.start_date.checked_add_months(Months::new(12)).unwrap()
        );

        let state = service.ledger().property_state(property.id);
        assert!(state.paid);
        assert!(state.publicized);
    }

    #[tokio::test]
    async fn test_verify_is_idempotent() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        let first = service.verify_payment(&init.reference).await.unwrap();
        let second = service.verify_payment(&init.reference).await.unwrap();

        assert_eq!(first.status, TransactionStatus::Success);
        assert_eq!(second.status, TransactionStatus::Success);
        // The settled transaction is answered locally, without a provider call
        assert_eq!(service.gateway().verify_calls(), 1);
        assert_eq!(service.ledger().grant_count(), 1);
    }

    #[tokio::test]
    async fn test_verify_unknown_reference() {
        let service = service();
        let result = service.verify_payment("REF-0-deadbeef").await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_verify_provider_pending_leaves_transaction_pending() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();
        service.gateway().set_verify_status(ProviderStatus::Pending);

        let response = service.verify_payment(&init.reference).await.unwrap();

        assert_eq!(response.status, TransactionStatus::Pending);
        assert!(response.grant.is_none());
        let stored = service.ledger().stored_transaction(&init.reference);
        assert_eq!(stored.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_verify_provider_unreachable_is_retryable() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();
        service.gateway().set_verify_unreachable(true);

        let result = service.verify_payment(&init.reference).await;
        assert!(matches!(result, Err(AppError::Provider(_))));
        assert_eq!(
            service.ledger().stored_transaction(&init.reference).status,
            TransactionStatus::Pending
        );

        // A later poll settles it
        service.gateway().set_verify_unreachable(false);
        let response = service.verify_payment(&init.reference).await.unwrap();
        assert_eq!(response.status, TransactionStatus::Success);
    }

    #[tokio::test]
    async fn test_failed_outcome_is_terminal() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();
        service.gateway().set_verify_status(ProviderStatus::Failed);

        let response = service.verify_payment(&init.reference).await.unwrap();
        assert_eq!(response.status, TransactionStatus::Failed);
        assert!(response.grant.is_none());
        assert!(!service.ledger().property_state(property.id).paid);

        // A later success report cannot resurrect a failed transaction
        service.gateway().set_verify_status(ProviderStatus::Success);
        let response = service.verify_payment(&init.reference).await.unwrap();
        assert_eq!(response.status, TransactionStatus::Failed);
        assert_eq!(service.gateway().verify_calls(), 1);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Webhooks
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_webhook_success_creates_one_grant() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        let (body, signature) = signed_event("charge.success", &init.reference, WEBHOOK_SECRET);
        let disposition = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Processed);
        assert_eq!(service.ledger().grant_count(), 1);
        assert!(service.ledger().property_state(property.id).paid);
    }

    #[tokio::test]
    async fn test_webhook_replay_is_acknowledged_without_effect() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        let (body, signature) = signed_event("charge.success", &init.reference, WEBHOOK_SECRET);
        let first = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();
        let second = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();

        assert_eq!(first, WebhookDisposition::Processed);
        assert_eq!(second, WebhookDisposition::AlreadyProcessed);
        assert_eq!(service.ledger().grant_count(), 1);
    }

    #[tokio::test]
    async fn test_webhook_invalid_signature_writes_nothing() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();

        let (body, signature) =
            signed_event("charge.success", &init.reference, "sk_wrong_secret");
        let result = service.process_webhook(&body, Some(&signature)).await;

        assert!(matches!(result, Err(AppError::InvalidSignature)));
        assert_eq!(
            service.ledger().stored_transaction(&init.reference).status,
            TransactionStatus::Pending
        );
        assert_eq!(service.ledger().grant_count(), 0);
    }

    #[tokio::test]
    async fn test_webhook_missing_signature_rejected() {
        let service = service();
        let (body, _) = signed_event("charge.success", "REF-0-deadbeef", WEBHOOK_SECRET);

        let result = service.process_webhook(&body, None).await;
        assert!(matches!(result, Err(AppError::InvalidSignature)));
    }

    #[tokio::test]
    async fn test_webhook_ignores_unrelated_events() {
        let service = service();
        let (body, signature) = signed_event("transfer.success", "REF-0-deadbeef", WEBHOOK_SECRET);

        let disposition = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();
        assert_eq!(disposition, WebhookDisposition::Ignored);
    }

    #[tokio::test]
    async fn test_webhook_unknown_reference() {
        let service = service();
        let (body, signature) = signed_event("charge.success", "REF-0-deadbeef", WEBHOOK_SECRET);

        let result = service.process_webhook(&body, Some(&signature)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_webhook_after_verify_converges() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 0);

        let init = service
            .initialize_payment(init_request(&property, &account, "rent"))
            .await
            .unwrap();
        service.verify_payment(&init.reference).await.unwrap();

        // The push confirmation arrives after the poll already settled it
        let (body, signature) = signed_event("charge.success", &init.reference, WEBHOOK_SECRET);
        let disposition = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::AlreadyProcessed);
        assert_eq!(service.ledger().grant_count(), 1);
    }

    #[tokio::test]
    async fn test_inspection_fee_success_never_marks_paid() {
        let service = service();
        let account = service.ledger().add_account();
        let property = service.ledger().add_property(120_000, 5_000);

        let init = service
            .initialize_payment(init_request(&property, &account, "inspection_fee"))
            .await
            .unwrap();

        let (body, signature) = signed_event("charge.success", &init.reference, WEBHOOK_SECRET);
        let disposition = service
            .process_webhook(&body, Some(&signature))
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Processed);
        assert_eq!(service.ledger().grant_count(), 0);
        let state = service.ledger().property_state(property.id);
        assert!(!state.paid);
        assert!(!state.publicized);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History & rates
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_payment_history_paginates() {
        let service = service();
        let account = service.ledger().add_account();

        for _ in 0..3 {
            let property = service.ledger().add_property(120_000, 0);
            service
                .initialize_payment(init_request(&property, &account, "rent"))
                .await
                .unwrap();
        }

        let page = service.payment_history(account.id, 1, 2).await.unwrap();
        assert_eq!(page.transactions.len(), 2);
        assert_eq!(page.pagination.total, 3);
        assert_eq!(page.pagination.pages, 2);

        let last = service.payment_history(account.id, 2, 2).await.unwrap();
        assert_eq!(last.transactions.len(), 1);
    }

    #[tokio::test]
    async fn test_payment_history_unknown_account() {
        let service = service();
        let result = service.payment_history(AccountId::new(), 1, 10).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_currency_rates_requires_snapshot() {
        let service = service();
        assert!(matches!(
            service.currency_rates().await,
            Err(AppError::RatesUnavailable)
        ));

        service.ledger().set_rates(0.00065, 0.00060, 0.00051);
        let rates = service.currency_rates().await.unwrap();
        assert_eq!(rates.usd, 0.00065);
    }

    #[tokio::test]
    async fn test_rates_refresh_is_visible_to_conversion() {
        let service = service();
        let today = Utc::now().date_naive();

        // The out-of-scope refresher job drives this port directly
        service
            .ledger()
            .refresh_rates(0.00070, 0.00064, 0.00055, today)
            .await
            .unwrap();

        let rates = service.currency_rates().await.unwrap();
        assert_eq!(rates.usd, 0.00070);
        assert_eq!(rates.last_updated, today);

        // Refreshing again the same day converges on the same snapshot
        service
            .ledger()
            .refresh_rates(0.00070, 0.00064, 0.00055, today)
            .await
            .unwrap();
        let again = service.currency_rates().await.unwrap();
        assert_eq!(again.usd, rates.usd);
        assert_eq!(again.last_updated, rates.last_updated);
    }

    #[tokio::test]
    async fn test_supported_currencies_lists_all() {
        let service = service();
        let currencies = service.supported_currencies();
        assert_eq!(currencies.len(), 4);
        assert!(currencies.iter().any(|c| c.code == Currency::NGN));
    }
}
