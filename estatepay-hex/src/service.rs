//! Payment Application Service
//!
//! Orchestrates the payment lifecycle through the ledger and gateway ports.
//! Contains NO infrastructure logic - pure business orchestration.
//!
//! Client-initiated verification and provider webhooks both funnel into the
//! ledger's `apply_outcome`, so the two confirmation paths can never diverge.

use chrono::Utc;

use estatepay_types::{
    AccountId, AppError, Currency, GrantDetails, GrantTerm, InitializePaymentRequest,
    InitializePaymentResponse, NewPayment, Pagination, PaymentGateway, PaymentHistoryResponse,
    PaymentLedger, PaymentOutcome, PropertyGrant, PropertyId, ProviderStatus, Purpose,
    RatesResponse, SessionRequest, SupportedCurrency, Transaction, TransactionStatus,
    TransactionView, VerifyPaymentResponse, WebhookDisposition, WebhookEvent,
    calculate_commission, domain::purpose::DurationUnit, generate_reference, grant_window,
    validate_purpose,
};

use estatepay_repo::signature::verify_webhook_signature;

const MAX_HISTORY_PAGE_SIZE: u32 = 100;

/// Application service for the payment transaction lifecycle.
///
/// Generic over `L: PaymentLedger` and `G: PaymentGateway` - adapters are
/// injected at compile time. This enables:
/// - Swapping the store or provider without code changes
/// - Testing the full reconciliation state machine with in-memory fakes
/// - Compile-time checks for port implementation
pub struct PaymentService<L: PaymentLedger, G: PaymentGateway> {
    ledger: L,
    gateway: G,
    webhook_secret: String,
    callback_base_url: String,
}

impl<L: PaymentLedger, G: PaymentGateway> PaymentService<L, G> {
    /// Creates a new payment service.
    ///
    /// `webhook_secret` is the shared secret the provider signs webhook
    /// deliveries with; `callback_base_url` is where payers land after the
    /// hosted payment page.
    pub fn new(
        ledger: L,
        gateway: G,
        webhook_secret: impl Into<String>,
        callback_base_url: impl Into<String>,
    ) -> Self {
        Self {
            ledger,
            gateway,
            webhook_secret: webhook_secret.into(),
            callback_base_url: callback_base_url.into(),
        }
    }

    /// Returns a reference to the underlying ledger.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Returns a reference to the underlying gateway.
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Initialization
    // ─────────────────────────────────────────────────────────────────────────

    /// Opens a hosted payment session and records the pending attempt.
    pub async fn initialize_payment(
        &self,
        req: InitializePaymentRequest,
    ) -> Result<InitializePaymentResponse, AppError> {
        let property_id: PropertyId = req
            .property_id
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid property ID".into()))?;
        let account_id: AccountId = req
            .account_id
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid account ID".into()))?;
        let purpose: Purpose = req.purpose.parse()?;
        let currency: Currency = req.currency.parse()?;

        let property = self
            .ledger
            .get_property(property_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Property not found".into()))?;

        validate_purpose(purpose, &property)?;

        let term = match purpose.pricing().duration_unit {
            DurationUnit::Months => {
                if req.duration_months < 1 {
                    return Err(AppError::BadRequest(
                        "Duration in months is required for rent payments".into(),
                    ));
                }
                GrantTerm::months(req.duration_months)
            }
            DurationUnit::Days => {
                if req.duration_days < 1 {
                    return Err(AppError::BadRequest(
                        "Duration in days is required for shortlet payments".into(),
                    ));
                }
                GrantTerm::days(req.duration_days)
            }
            DurationUnit::None | DurationUnit::Permanent => GrantTerm::none(),
        };

        let amount = purpose.amount_for(&property);
        if amount <= 0 {
            return Err(AppError::BadRequest("Invalid amount for payment".into()));
        }

        // Pre-flight duplicate guard; `create_pending` re-checks atomically.
        if purpose.grants_access()
            && (property.paid || self.ledger.has_qualifying_success(property.id).await?)
        {
            return Err(AppError::DuplicatePayment);
        }

        let account = self
            .ledger
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".into()))?;

        let start_date = req.start_date.unwrap_or_else(Utc::now);
        let end_date = grant_window(purpose, term, start_date).map(|(_, end)| end);

        let reference = generate_reference();
        let commission = calculate_commission(amount);

        let display_amount = if currency.is_base() {
            amount
        } else {
            let snapshot = self
                .ledger
                .current_rates()
                .await?
                .ok_or(AppError::RatesUnavailable)?;
            snapshot.convert(amount, currency)
        };

        let callback_url = format!(
            "{}/payment/verify?reference={}",
            self.callback_base_url, reference
        );

        let metadata = serde_json::json!({
            "accountId": account.id,
            "propertyId": property.id,
            "purpose": purpose.as_str(),
            "baseAmount": amount,
            "baseCurrency": Currency::BASE,
            "displayAmount": display_amount,
            "displayCurrency": currency,
            "durationMonths": term.months,
            "durationDays": term.days,
            "startDate": start_date,
            "endDate": end_date,
        });

        let session = self
            .gateway
            .initialize_session(SessionRequest {
                email: account.email,
                amount: display_amount,
                currency,
                reference: reference.clone(),
                callback_url,
                metadata,
            })
            .await?;

        let transaction = self
            .ledger
            .create_pending(NewPayment {
                property_id: property.id,
                account_id: account.id,
                purpose,
                reference,
                amount,
                display_currency: currency,
                commission,
                term,
                start_date,
            })
            .await?;

        tracing::info!(
            reference = %transaction.reference,
            purpose = %purpose,
            amount,
            "payment initialized"
        );

        Ok(InitializePaymentResponse {
            payment_link: session.authorization_url,
            reference: transaction.reference,
            access_code: session.access_code,
            amount: display_amount,
            currency,
            base_amount: amount,
            base_currency: Currency::BASE,
            duration_months: term.months,
            duration_days: term.days,
            start_date,
            end_date,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Client-initiated verification: the payer polls after returning from
    /// the hosted payment page.
    ///
    /// An already-terminal transaction is answered from the ledger without
    /// contacting the provider again. A provider report of success or failure
    /// is applied through `apply_outcome`; anything still in flight leaves
    /// the transaction pending and is safe to poll again.
    pub async fn verify_payment(
        &self,
        reference: &str,
    ) -> Result<VerifyPaymentResponse, AppError> {
        let transaction = self
            .ledger
            .find_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::NotFound("Transaction not found".into()))?;

        if transaction.is_terminal() {
            let grant = self.ledger.find_grant_for_transaction(transaction.id).await?;
            return Ok(verification_response(&transaction, grant.as_ref()));
        }

        let verification = self.gateway.verify_by_reference(reference).await?;

        let outcome = match verification.status {
            ProviderStatus::Success => PaymentOutcome::Success,
            ProviderStatus::Failed => PaymentOutcome::Failed,
            ProviderStatus::Pending => {
                // Payment still in flight on the provider side; report
                // pending and let a later poll or webhook settle it.
                return Ok(verification_response(&transaction, None));
            }
        };

        let reconciliation = self.ledger.apply_outcome(reference, outcome).await?;

        if reconciliation.newly_applied {
            tracing::info!(
                reference,
                status = %reconciliation.transaction.status,
                "payment reconciled via verification"
            );
        }

        Ok(verification_response(
            &reconciliation.transaction,
            reconciliation.grant.as_ref(),
        ))
    }

    /// Provider webhook: an asynchronous, possibly-duplicated, signed event.
    ///
    /// The signature is checked over the raw body before anything is parsed
    /// or written; replays of settled events are acknowledged without effect.
    pub async fn process_webhook(
        &self,
        raw_body: &[u8],
        signature: Option<&str>,
    ) -> Result<WebhookDisposition, AppError> {
        let signature = signature.ok_or(AppError::InvalidSignature)?;

        if !verify_webhook_signature(raw_body, signature, &self.webhook_secret) {
            tracing::warn!("webhook rejected: signature mismatch");
            return Err(AppError::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(raw_body)
            .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {}", e)))?;

        let outcome = match event.event.as_str() {
            "charge.success" => PaymentOutcome::Success,
            "charge.failed" => PaymentOutcome::Failed,
            other => {
                tracing::debug!(event = other, "ignoring webhook event");
                return Ok(WebhookDisposition::Ignored);
            }
        };

        if event.data.reference.is_empty() {
            return Err(AppError::BadRequest("Webhook event missing reference".into()));
        }

        let reconciliation = self
            .ledger
            .apply_outcome(&event.data.reference, outcome)
            .await?;

        if reconciliation.newly_applied {
            tracing::info!(
                reference = %event.data.reference,
                status = %reconciliation.transaction.status,
                "payment reconciled via webhook"
            );
            Ok(WebhookDisposition::Processed)
        } else {
            tracing::debug!(
                reference = %event.data.reference,
                "webhook replay for settled transaction"
            );
            Ok(WebhookDisposition::AlreadyProcessed)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // History & rates
    // ─────────────────────────────────────────────────────────────────────────

    /// Lists a payer's transactions, newest first.
    pub async fn payment_history(
        &self,
        account_id: AccountId,
        page: u32,
        limit: u32,
    ) -> Result<PaymentHistoryResponse, AppError> {
        // Verify the account exists first
        self.ledger
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Account not found".into()))?;

        let page = page.max(1);
        let limit = limit.clamp(1, MAX_HISTORY_PAGE_SIZE);

        let (transactions, total) = self.ledger.list_for_account(account_id, page, limit).await?;

        let pages = (total + limit as i64 - 1) / limit as i64;

        Ok(PaymentHistoryResponse {
            transactions: transactions.iter().map(TransactionView::from).collect(),
            pagination: Pagination {
                page,
                limit,
                total,
                pages,
            },
        })
    }

    /// Returns the current exchange-rate snapshot.
    pub async fn currency_rates(&self) -> Result<RatesResponse, AppError> {
        let snapshot = self
            .ledger
            .current_rates()
            .await?
            .ok_or(AppError::RatesUnavailable)?;

        Ok(RatesResponse::from(&snapshot))
    }

    /// The currencies the marketplace can quote in.
    pub fn supported_currencies(&self) -> Vec<SupportedCurrency> {
        Currency::all()
            .iter()
            .map(|c| SupportedCurrency {
                code: *c,
                name: c.name(),
                symbol: c.symbol(),
            })
            .collect()
    }
}

/// Builds the poll response for a transaction's current state.
fn verification_response(
    transaction: &Transaction,
    grant: Option<&PropertyGrant>,
) -> VerifyPaymentResponse {
    let grant = match transaction.status {
        TransactionStatus::Success => {
            grant.map(|g| GrantDetails::from_grant(g, Utc::now()))
        }
        _ => None,
    };

    VerifyPaymentResponse {
        status: transaction.status,
        reference: transaction.reference.clone(),
        amount: transaction.amount.amount(),
        currency: transaction.amount.currency(),
        grant,
    }
}
