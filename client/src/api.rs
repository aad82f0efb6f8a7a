//! Low-level REST client for the clinic backend.
//!
//! One method per endpoint, no business logic: request shaping, bearer
//! auth from the session context, and mapping of failures onto
//! [`ClientError`]. Server-sent field validation arrays are preserved
//! entry by entry.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use shared::{
    Budget, BudgetDraft, CancelPaymentRequest, CancelPaymentResponse, CreatePaymentRequest,
    ErrorBody, FinancialReport, LoginRequest, Payment, PaymentSummary, SessionUser,
    UpdateBudgetStatusRequest,
};

use crate::error::ClientError;
use crate::session::Session;

/// HTTP client for the clinic REST API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_session(base_url, Session::new())
    }

    /// Build a client around an existing session (e.g. a restored login).
    pub fn with_session(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send a request and decode a JSON body, mapping transport failures
    /// to `Network` and non-2xx statuses to `Remote`.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::remote_error(status.as_u16(), response).await);
        }

        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Remote {
                status: status.as_u16(),
                message: format!("unreadable response body: {err}"),
                field_errors: Vec::new(),
            })
    }

    /// Like [`execute`](Self::execute) for endpoints whose body we discard.
    async fn execute_no_body(&self, request: reqwest::RequestBuilder) -> Result<(), ClientError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|err| ClientError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::remote_error(status.as_u16(), response).await);
        }
        Ok(())
    }

    async fn remote_error(status: u16, response: reqwest::Response) -> ClientError {
        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        let field_errors: Vec<String> = body.errors.iter().map(|err| err.to_message()).collect();
        let message = body
            .error
            .or(body.message)
            .or_else(|| field_errors.first().cloned())
            .unwrap_or_else(|| {
                if text.is_empty() {
                    format!("HTTP {status}")
                } else {
                    text
                }
            });
        ClientError::Remote {
            status,
            message,
            field_errors,
        }
    }

    // --- session ---

    /// `POST /api/login`. On success the session context is started with
    /// the returned user.
    pub async fn login(&mut self, request: &LoginRequest) -> Result<SessionUser, ClientError> {
        let url = self.url("/api/login");
        let user: SessionUser = self.execute(self.http.post(&url).json(request)).await?;
        self.session.start(user.clone());
        Ok(user)
    }

    // --- budgets ---

    pub async fn budgets(&self) -> Result<Vec<Budget>, ClientError> {
        self.execute(self.http.get(self.url("/api/budgets"))).await
    }

    pub async fn budget(&self, id: &str) -> Result<Budget, ClientError> {
        self.execute(self.http.get(self.url(&format!("/api/budgets/{id}"))))
            .await
    }

    pub async fn budgets_by_patient(&self, patient_id: &str) -> Result<Vec<Budget>, ClientError> {
        self.execute(
            self.http
                .get(self.url(&format!("/api/budgets/paciente/{patient_id}"))),
        )
        .await
    }

    pub async fn create_budget(&self, draft: &BudgetDraft) -> Result<Budget, ClientError> {
        self.execute(self.http.post(self.url("/api/budgets")).json(draft))
            .await
    }

    /// Seed a budget from an existing treatment plan, server-side.
    pub async fn create_budget_from_treatment(
        &self,
        treatment_plan_id: &str,
    ) -> Result<Budget, ClientError> {
        self.execute(
            self.http
                .post(self.url(&format!("/api/budgets/from-treatment/{treatment_plan_id}"))),
        )
        .await
    }

    /// The budget attached to a treatment plan, if one exists.
    pub async fn budget_by_treatment(&self, treatment_id: &str) -> Result<Budget, ClientError> {
        self.execute(
            self.http
                .get(self.url(&format!("/api/budgets/treatment/{treatment_id}"))),
        )
        .await
    }

    /// Create a budget already attached to a treatment plan.
    pub async fn create_budget_for_treatment(
        &self,
        treatment_id: &str,
        draft: &BudgetDraft,
    ) -> Result<Budget, ClientError> {
        self.execute(
            self.http
                .post(self.url(&format!("/api/budgets/treatment/{treatment_id}")))
                .json(draft),
        )
        .await
    }

    pub async fn update_budget_status(
        &self,
        id: &str,
        request: &UpdateBudgetStatusRequest,
    ) -> Result<Budget, ClientError> {
        self.execute(
            self.http
                .patch(self.url(&format!("/api/budgets/{id}/estado")))
                .json(request),
        )
        .await
    }

    pub async fn update_budget(&self, id: &str, budget: &BudgetDraft) -> Result<Budget, ClientError> {
        self.execute(
            self.http
                .put(self.url(&format!("/api/budgets/{id}")))
                .json(budget),
        )
        .await
    }

    pub async fn delete_budget(&self, id: &str) -> Result<(), ClientError> {
        self.execute_no_body(self.http.delete(self.url(&format!("/api/budgets/{id}"))))
            .await
    }

    // --- payments ---

    pub async fn payment_summary(&self, budget_id: &str) -> Result<PaymentSummary, ClientError> {
        self.execute(
            self.http
                .get(self.url(&format!("/api/payments/budget/{budget_id}/summary"))),
        )
        .await
    }

    pub async fn create_payment(
        &self,
        budget_id: &str,
        phase_index: usize,
        request: &CreatePaymentRequest,
    ) -> Result<Payment, ClientError> {
        self.execute(
            self.http
                .post(self.url(&format!(
                    "/api/payments/budget/{budget_id}/fase/{phase_index}/pago"
                )))
                .json(request),
        )
        .await
    }

    /// Like [`create_payment`](Self::create_payment) for payments booked
    /// against a treatment plan.
    pub async fn create_payment_for_treatment(
        &self,
        budget_id: &str,
        phase_index: usize,
        treatment_id: &str,
        request: &CreatePaymentRequest,
    ) -> Result<Payment, ClientError> {
        self.execute(
            self.http
                .post(self.url(&format!(
                    "/api/payments/budget/{budget_id}/fase/{phase_index}/treatment/{treatment_id}/pago"
                )))
                .json(request),
        )
        .await
    }

    pub async fn cancel_payment(
        &self,
        budget_id: &str,
        phase_index: usize,
        payment_id: &str,
        request: &CancelPaymentRequest,
    ) -> Result<CancelPaymentResponse, ClientError> {
        self.execute(
            self.http
                .patch(self.url(&format!(
                    "/api/payments/budget/{budget_id}/fase/{phase_index}/pago/{payment_id}/anular"
                )))
                .json(request),
        )
        .await
    }

    // --- financial reports ---

    pub async fn monthly_report(&self, month: u32, year: i32) -> Result<FinancialReport, ClientError> {
        self.execute(
            self.http
                .get(self.url("/api/financial-reports/mensual"))
                .query(&[("mes", month.to_string()), ("año", year.to_string())]),
        )
        .await
    }

    pub async fn annual_report(&self, year: i32) -> Result<FinancialReport, ClientError> {
        self.execute(
            self.http
                .get(self.url("/api/financial-reports/anual"))
                .query(&[("año", year.to_string())]),
        )
        .await
    }

    pub async fn range_report(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<FinancialReport, ClientError> {
        self.execute(
            self.http
                .get(self.url("/api/financial-reports/rango"))
                .query(&[
                    ("fechaInicio", from.format("%Y-%m-%d").to_string()),
                    ("fechaFin", to.format("%Y-%m-%d").to_string()),
                ]),
        )
        .await
    }
}
