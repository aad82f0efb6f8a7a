//! Facade over the REST API for the presentation layer.
//!
//! Every mutating operation follows the same discipline: validate locally,
//! submit, then unconditionally refetch the payment summary and replace
//! the held copy. Local optimistic math is never the final state — two
//! front-desk sessions can mutate the same budget concurrently and only
//! the server sees both.

use shared::{
    Budget, BudgetDraft, CancelPaymentRequest, CreatePaymentRequest, FinancialReport, Phase,
    PaymentMethod, PaymentSummary, SessionUser, UpdateBudgetStatusRequest,
};
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::domain::{budget_math, ledger};
use crate::error::{ClientError, NotFoundError, ValidationError};
use crate::session::Session;

/// Stable operation set for budgets and payments.
#[derive(Debug, Clone)]
pub struct ClinicClient {
    api: ApiClient,
    /// Last reconciled summary and the budget it belongs to. Replaced in
    /// place after every mutation, never merged.
    current_summary: Option<(String, PaymentSummary)>,
}

impl ClinicClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, Session::new())
    }

    pub fn with_session(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            api: ApiClient::with_session(base_url, session),
            current_summary: None,
        }
    }

    pub fn session(&self) -> &Session {
        self.api.session()
    }

    // --- session lifecycle ---

    pub async fn login(&mut self, username: &str, password: &str) -> Result<SessionUser, ClientError> {
        let user = self
            .api
            .login(&shared::LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        info!(username, "session started");
        Ok(user)
    }

    pub fn logout(&mut self) {
        self.api.session_mut().end();
        self.current_summary = None;
        info!("session ended");
    }

    // --- budgets ---

    /// Compute authoritative totals over the draft, then submit the whole
    /// budget. The server's copy is returned; a total that disagrees with
    /// the local calculation is a bug signal, logged rather than
    /// reconciled silently.
    pub async fn create_budget(&self, draft: BudgetDraft) -> Result<Budget, ClientError> {
        Self::validate_draft(&draft.phases)?;
        let totals = budget_math::calculate_totals(&draft.phases);
        let draft = BudgetDraft {
            phases: totals.phases,
            total_general: totals.total_general,
            ..draft
        };

        let created = self.api.create_budget(&draft).await?;
        if (created.total_general - totals.total_general).abs() > ledger::AMOUNT_EPSILON {
            warn!(
                local = totals.total_general,
                server = created.total_general,
                budget_id = %created.id,
                "server budget total differs from local calculation"
            );
        }
        info!(budget_id = %created.id, total = created.total_general, "budget created");
        Ok(created)
    }

    /// Full-budget replacement; phases and procedures are never patched
    /// piecemeal. Totals are recomputed before submission like on create.
    pub async fn update_budget(&self, id: &str, draft: BudgetDraft) -> Result<Budget, ClientError> {
        Self::validate_draft(&draft.phases)?;
        let totals = budget_math::calculate_totals(&draft.phases);
        let draft = BudgetDraft {
            phases: totals.phases,
            total_general: totals.total_general,
            ..draft
        };

        let updated = self.api.update_budget(id, &draft).await?;
        if (updated.total_general - totals.total_general).abs() > ledger::AMOUNT_EPSILON {
            warn!(
                local = totals.total_general,
                server = updated.total_general,
                budget_id = id,
                "server budget total differs from local calculation"
            );
        }
        Ok(updated)
    }

    pub async fn budget(&self, id: &str) -> Result<Budget, ClientError> {
        self.api.budget(id).await
    }

    pub async fn budgets(&self) -> Result<Vec<Budget>, ClientError> {
        self.api.budgets().await
    }

    pub async fn budgets_by_patient(&self, patient_id: &str) -> Result<Vec<Budget>, ClientError> {
        self.api.budgets_by_patient(patient_id).await
    }

    /// Seed a budget from a treatment plan; the server does the copying.
    pub async fn create_budget_from_treatment(
        &self,
        treatment_plan_id: &str,
    ) -> Result<Budget, ClientError> {
        self.api.create_budget_from_treatment(treatment_plan_id).await
    }

    /// The budget attached to a treatment plan.
    pub async fn budget_by_treatment(&self, treatment_id: &str) -> Result<Budget, ClientError> {
        self.api.budget_by_treatment(treatment_id).await
    }

    /// Create a budget attached to a treatment plan. Totals are computed
    /// locally like on a plain create.
    pub async fn create_budget_for_treatment(
        &self,
        treatment_id: &str,
        draft: BudgetDraft,
    ) -> Result<Budget, ClientError> {
        Self::validate_draft(&draft.phases)?;
        let totals = budget_math::calculate_totals(&draft.phases);
        let draft = BudgetDraft {
            phases: totals.phases,
            total_general: totals.total_general,
            ..draft
        };
        self.api.create_budget_for_treatment(treatment_id, &draft).await
    }

    /// Move a budget through its workflow states. The status vocabulary
    /// is the server's; invalid transitions come back as remote errors.
    pub async fn update_budget_status(&self, id: &str, status: &str) -> Result<Budget, ClientError> {
        info!(budget_id = id, status, "updating budget status");
        self.api
            .update_budget_status(
                id,
                &UpdateBudgetStatusRequest {
                    status: status.to_string(),
                },
            )
            .await
    }

    pub async fn delete_budget(&mut self, id: &str) -> Result<(), ClientError> {
        self.api.delete_budget(id).await?;
        if matches!(&self.current_summary, Some((held, _)) if held == id) {
            self.current_summary = None;
        }
        Ok(())
    }

    // --- payments ---

    /// Fetch and reconcile the payment summary for a budget, replacing the
    /// held copy.
    pub async fn payment_summary(&mut self, budget_id: &str) -> Result<PaymentSummary, ClientError> {
        self.refetch_summary(budget_id).await
    }

    /// The summary currently held for `budget_id`, if any.
    pub fn held_summary(&self, budget_id: &str) -> Option<&PaymentSummary> {
        match &self.current_summary {
            Some((held, summary)) if held == budget_id => Some(summary),
            _ => None,
        }
    }

    /// Validate locally, submit, then refetch; the refetched summary is
    /// returned and becomes the held copy.
    ///
    /// Validation runs against our latest view of the pending balance. No
    /// optimistic-locking token passes through this API, so a concurrent
    /// payment from another session can still land first and only the
    /// server can refuse the resulting over-payment.
    pub async fn register_payment(
        &mut self,
        budget_id: &str,
        phase_index: usize,
        request: CreatePaymentRequest,
    ) -> Result<PaymentSummary, ClientError> {
        let summary = match self.held_summary(budget_id).cloned() {
            Some(summary) => summary,
            None => self.refetch_summary(budget_id).await?,
        };
        let phase = summary
            .phases
            .get(phase_index)
            .ok_or(NotFoundError::Phase(phase_index))?;
        ledger::validate_payment_amount(request.amount, phase.pending_balance)?;

        info!(
            budget_id,
            phase_index,
            amount = request.amount,
            "registering payment"
        );
        self.api
            .create_payment(budget_id, phase_index, &request)
            .await?;
        self.refetch_summary(budget_id).await
    }

    /// Like [`register_payment`](Self::register_payment) for payments
    /// booked against a treatment plan. Same guards, same refetch.
    pub async fn register_payment_for_treatment(
        &mut self,
        budget_id: &str,
        phase_index: usize,
        treatment_id: &str,
        request: CreatePaymentRequest,
    ) -> Result<PaymentSummary, ClientError> {
        let summary = match self.held_summary(budget_id).cloned() {
            Some(summary) => summary,
            None => self.refetch_summary(budget_id).await?,
        };
        let phase = summary
            .phases
            .get(phase_index)
            .ok_or(NotFoundError::Phase(phase_index))?;
        ledger::validate_payment_amount(request.amount, phase.pending_balance)?;

        info!(
            budget_id,
            phase_index,
            treatment_id,
            amount = request.amount,
            "registering treatment payment"
        );
        self.api
            .create_payment_for_treatment(budget_id, phase_index, treatment_id, &request)
            .await?;
        self.refetch_summary(budget_id).await
    }

    /// Cancel a payment (soft delete, kept for audit). Requires a
    /// non-empty reason; the server re-enforces this as the real contract.
    pub async fn cancel_payment(
        &mut self,
        budget_id: &str,
        phase_index: usize,
        payment_id: &str,
        reason: &str,
    ) -> Result<PaymentSummary, ClientError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyCancellationReason.into());
        }

        // Stale phase or payment references are refused before any
        // request. The check runs on a scratch copy so the held summary
        // stays untouched until the server has accepted the cancellation.
        if let Some(summary) = self.held_summary(budget_id) {
            let mut preview = summary.clone();
            ledger::apply_cancellation(&mut preview, phase_index, payment_id)?;
        }

        info!(budget_id, phase_index, payment_id, "cancelling payment");
        self.api
            .cancel_payment(
                budget_id,
                phase_index,
                payment_id,
                &CancelPaymentRequest {
                    reason: reason.to_string(),
                },
            )
            .await?;
        self.refetch_summary(budget_id).await
    }

    /// Methods the clinic accepts, in menu order.
    pub fn payment_methods(&self) -> &'static [PaymentMethod] {
        &PaymentMethod::ALL
    }

    // --- financial reports ---

    pub async fn monthly_report(&self, month: u32, year: i32) -> Result<FinancialReport, ClientError> {
        self.api.monthly_report(month, year).await
    }

    pub async fn annual_report(&self, year: i32) -> Result<FinancialReport, ClientError> {
        self.api.annual_report(year).await
    }

    pub async fn range_report(
        &self,
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    ) -> Result<FinancialReport, ClientError> {
        self.api.range_report(from, to).await
    }

    // --- internals ---

    async fn refetch_summary(&mut self, budget_id: &str) -> Result<PaymentSummary, ClientError> {
        // Dropped up front: once a mutation has landed the old copy is
        // stale, and a failed fetch must not leave it standing.
        self.current_summary = None;
        let mut summary = self.api.payment_summary(budget_id).await?;
        ledger::reconcile(&mut summary);
        self.current_summary = Some((budget_id.to_string(), summary.clone()));
        Ok(summary)
    }

    /// Draft validation owed to the calculator, which assumes well-formed
    /// input.
    fn validate_draft(phases: &[Phase]) -> Result<(), ValidationError> {
        for phase in phases {
            for procedure in &phase.procedures {
                if !procedure.unit_cost.is_finite() || procedure.unit_cost < 0.0 {
                    return Err(ValidationError::NegativeUnitCost);
                }
            }
        }
        Ok(())
    }
}
