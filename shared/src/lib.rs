use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A costed treatment plan for a patient, composed of ordered phases.
///
/// The server owns the durable copy and assigns `id`; field names on the
/// wire follow the server's Spanish contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(rename = "_id")]
    pub id: String,
    /// Patient reference (server id).
    #[serde(rename = "paciente")]
    pub patient_id: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
    /// Ordered phases; `total_general` must equal the sum of their totals.
    #[serde(rename = "fases")]
    pub phases: Vec<Phase>,
    #[serde(rename = "totalGeneral")]
    pub total_general: f64,
}

/// A budget draft before the server has assigned an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDraft {
    #[serde(rename = "paciente")]
    pub patient_id: String,
    #[serde(rename = "especialidad")]
    pub specialty: String,
    #[serde(rename = "fases")]
    pub phases: Vec<Phase>,
    #[serde(rename = "totalGeneral", default)]
    pub total_general: f64,
}

/// Body of `PATCH /api/budgets/{id}/estado`.
///
/// The status vocabulary belongs to the server; the client passes it
/// through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateBudgetStatusRequest {
    #[serde(rename = "estado")]
    pub status: String,
}

/// A named grouping of procedures within a budget, with its own subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Phase {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion", default)]
    pub description: String,
    /// Ordered line items; `total` must equal the sum of their cost totals.
    #[serde(rename = "procedimientos", default)]
    pub procedures: Vec<Procedure>,
    #[serde(rename = "total", default)]
    pub total: f64,
}

/// A billable line item: unit count times unit cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "numeroPiezas")]
    pub unit_count: u32,
    #[serde(rename = "costoPorUnidad")]
    pub unit_cost: f64,
    /// `unit_count * unit_cost`, filled in by the totals pass.
    #[serde(rename = "costoTotal", default)]
    pub cost_total: f64,
}

/// A recorded amount applied against a phase's balance.
///
/// Payments are append-only: cancellation flips `cancelled` but never
/// removes the record (audit trail).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "metodoPago")]
    pub method: PaymentMethod,
    /// ISO-8601 timestamp as sent by the server.
    #[serde(rename = "fecha")]
    pub date: String,
    #[serde(rename = "anulado", default)]
    pub cancelled: bool,
    /// Running phase balance after this payment was applied.
    #[serde(rename = "saldo", default)]
    pub balance_after: f64,
}

impl Payment {
    /// Parse the server timestamp. `None` when the string is not ISO-8601.
    pub fn parsed_date(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date).ok()
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "efectivo")]
    Cash,
    #[serde(rename = "transferencia")]
    Transfer,
    #[serde(rename = "tarjeta")]
    Card,
    #[serde(rename = "cheque")]
    Check,
}

impl PaymentMethod {
    /// All methods the clinic accepts, in menu order.
    pub const ALL: [PaymentMethod; 4] = [
        PaymentMethod::Cash,
        PaymentMethod::Transfer,
        PaymentMethod::Card,
        PaymentMethod::Check,
    ];

    /// Display label (the application is Spanish-facing).
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Efectivo",
            PaymentMethod::Transfer => "Transferencia",
            PaymentMethod::Card => "Tarjeta",
            PaymentMethod::Check => "Cheque",
        }
    }
}

/// Payment progress of a phase or of the whole budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PaymentStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "parcial")]
    Partial,
    #[serde(rename = "completado")]
    Paid,
}

/// Reconciled payment state for one budget, as returned by
/// `GET /api/payments/budget/{id}/summary`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSummary {
    #[serde(rename = "resumenGeneral")]
    pub overall: PaymentTotals,
    #[serde(rename = "fases")]
    pub phases: Vec<PhasePayments>,
}

/// Budget-level payment totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentTotals {
    #[serde(rename = "totalPresupuesto")]
    pub total_budget: f64,
    #[serde(rename = "totalPagado", default)]
    pub total_paid: f64,
    /// `total_budget - total_paid`; may go negative on over-payment, which
    /// is an error state callers must surface rather than clamp away.
    #[serde(rename = "saldoPendiente", default)]
    pub pending_balance: f64,
    #[serde(rename = "estadoPago", default)]
    pub status: PaymentStatus,
    #[serde(rename = "porcentajePagado", default)]
    pub percent_paid: f64,
}

/// Payment state of a single phase, with its full payment history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhasePayments {
    /// Position of the phase within the budget. The server's payment routes
    /// are positional, so this is part of the contract.
    #[serde(rename = "numeroFase", default)]
    pub phase_index: usize,
    #[serde(rename = "nombreFase")]
    pub phase_name: String,
    #[serde(rename = "totalFase")]
    pub phase_total: f64,
    #[serde(rename = "totalPagado", default)]
    pub total_paid: f64,
    #[serde(rename = "saldoPendiente", default)]
    pub pending_balance: f64,
    #[serde(rename = "estadoPago", default)]
    pub status: PaymentStatus,
    /// Ordered payment history, cancelled entries included.
    #[serde(rename = "pagos", default)]
    pub payments: Vec<Payment>,
}

/// Body of `POST /api/payments/budget/{id}/fase/{index}/pago`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePaymentRequest {
    #[serde(rename = "descripcion")]
    pub description: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "metodoPago")]
    pub method: PaymentMethod,
}

/// Body of `PATCH .../pago/{paymentId}/anular`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelPaymentRequest {
    #[serde(rename = "motivo")]
    pub reason: String,
}

/// Confirmation returned by the cancellation endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancelPaymentResponse {
    #[serde(rename = "pago", default)]
    pub payment: Option<Payment>,
    #[serde(rename = "mensaje", default)]
    pub message: String,
}

/// Body of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Logged-in user as returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    #[serde(rename = "nombre", default)]
    pub display_name: String,
    pub token: String,
}

/// Aggregated income figures from `/api/financial-reports/*`.
///
/// Read-only pass-through; the client does no math on these beyond
/// display formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialReport {
    #[serde(rename = "totalIngresos", default)]
    pub total_income: f64,
    #[serde(rename = "cantidadPagos", default)]
    pub payment_count: u32,
    #[serde(rename = "pagos", default)]
    pub payments: Vec<Payment>,
}

/// Error body shape the server uses for non-2xx responses.
///
/// Either a single `error`/`message` string or an express-validator style
/// `errors` array with one entry per offending field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// One field-level validation failure from the server.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub param: Option<String>,
    pub msg: String,
}

impl FieldError {
    /// Human-readable form, one message per failure.
    pub fn to_message(&self) -> String {
        match &self.param {
            Some(param) => format!("{}: {}", param, self.msg),
            None => self.msg.clone(),
        }
    }
}
