//! Payment ledger reconciliation.
//!
//! Totals are always recomputed from the full payment history rather than
//! adjusted incrementally, so a summary can never drift from its own
//! payment lists. The server remains the system of record; everything here
//! is a local view that gets replaced on the next fetch.

use shared::{Budget, Payment, PaymentMethod, PaymentStatus, PaymentSummary, PaymentTotals, PhasePayments};
use tracing::warn;

use crate::error::{NotFoundError, ValidationError};

/// Half a cent. Amounts travel as JSON decimals and accumulate in `f64`,
/// so comparisons must tolerate sub-cent residue without letting a real
/// over-payment through.
pub const AMOUNT_EPSILON: f64 = 0.005;

/// Build a reconciled summary from a budget's phase totals and the
/// authoritative payment history, one list per phase in phase order.
///
/// A payment list with no corresponding phase is a stale-index bug and
/// fails with [`NotFoundError::Phase`].
pub fn build_summary(
    budget: &Budget,
    payments_per_phase: &[Vec<Payment>],
) -> Result<PaymentSummary, NotFoundError> {
    if payments_per_phase.len() > budget.phases.len() {
        return Err(NotFoundError::Phase(budget.phases.len()));
    }

    let phases = budget
        .phases
        .iter()
        .enumerate()
        .map(|(index, phase)| PhasePayments {
            phase_index: index,
            phase_name: phase.name.clone(),
            phase_total: phase.total,
            total_paid: 0.0,
            pending_balance: 0.0,
            status: PaymentStatus::Pending,
            payments: payments_per_phase.get(index).cloned().unwrap_or_default(),
        })
        .collect();

    let mut summary = PaymentSummary {
        overall: PaymentTotals {
            total_budget: budget.total_general,
            total_paid: 0.0,
            pending_balance: 0.0,
            status: PaymentStatus::Pending,
            percent_paid: 0.0,
        },
        phases,
    };
    reconcile(&mut summary);
    Ok(summary)
}

/// Recompute every derived figure of `summary` from its payment lists.
///
/// Applied to freshly fetched summaries too: servers are free to omit the
/// derived fields, and a locally recomputed figure that disagrees with the
/// server's totals is a bug signal we log rather than hide.
pub fn reconcile(summary: &mut PaymentSummary) {
    let mut overall_paid = 0.0;
    let mut phase_total_sum = 0.0;

    for (index, phase) in summary.phases.iter_mut().enumerate() {
        phase.phase_index = index;
        let paid: f64 = phase
            .payments
            .iter()
            .filter(|payment| !payment.cancelled)
            .map(|payment| payment.amount)
            .sum();
        phase.total_paid = paid;
        // Raw difference; may go negative on over-payment. Clamping is a
        // display concern and must not happen before detection.
        phase.pending_balance = phase.phase_total - paid;
        if phase.pending_balance < -AMOUNT_EPSILON {
            warn!(
                phase_index = index,
                pending = phase.pending_balance,
                "phase is over-paid"
            );
        }
        phase.status = payment_status(phase.phase_total, paid);
        overall_paid += paid;
        phase_total_sum += phase.phase_total;
    }

    let overall = &mut summary.overall;
    if (overall.total_budget - phase_total_sum).abs() > AMOUNT_EPSILON {
        warn!(
            total_budget = overall.total_budget,
            phase_total_sum, "budget total does not match the sum of its phase totals"
        );
    }
    overall.total_paid = overall_paid;
    overall.pending_balance = overall.total_budget - overall_paid;
    overall.status = payment_status(overall.total_budget, overall_paid);
    overall.percent_paid = if overall.total_budget > 0.0 {
        overall_paid / overall.total_budget * 100.0
    } else {
        0.0
    };
}

/// Pre-submission guard for a new payment.
///
/// The server stays the final authority: a concurrent payment from another
/// session can invalidate `pending_balance` between this check and the
/// request landing.
pub fn validate_payment_amount(amount: f64, pending_balance: f64) -> Result<(), ValidationError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ValidationError::NonPositiveAmount);
    }
    if amount > pending_balance + AMOUNT_EPSILON {
        return Err(ValidationError::AmountExceedsBalance);
    }
    Ok(())
}

/// Mark a payment cancelled in the local view and recompute the affected
/// totals. Returns the cancelled amount.
///
/// The record stays in the list (audit trail) and the caller must follow
/// up with a server refetch; this is optimistic-UI bookkeeping only.
pub fn apply_cancellation(
    summary: &mut PaymentSummary,
    phase_index: usize,
    payment_id: &str,
) -> Result<f64, NotFoundError> {
    let phase = summary
        .phases
        .get_mut(phase_index)
        .ok_or(NotFoundError::Phase(phase_index))?;
    let payment = phase
        .payments
        .iter_mut()
        .find(|payment| payment.id == payment_id)
        .ok_or_else(|| NotFoundError::Payment(phase_index, payment_id.to_string()))?;

    payment.cancelled = true;
    let amount = payment.amount;
    reconcile(summary);
    Ok(amount)
}

/// Derive the payment status from a total and the amount paid against it.
pub fn payment_status(total: f64, paid: f64) -> PaymentStatus {
    if total > AMOUNT_EPSILON && total - paid <= AMOUNT_EPSILON {
        PaymentStatus::Paid
    } else if paid > AMOUNT_EPSILON {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    }
}

/// Sum of non-cancelled payments per method, in first-seen order.
pub fn totals_by_method(payments: &[Payment]) -> Vec<(PaymentMethod, f64)> {
    let mut totals: Vec<(PaymentMethod, f64)> = Vec::new();
    for payment in payments.iter().filter(|payment| !payment.cancelled) {
        match totals.iter_mut().find(|(method, _)| *method == payment.method) {
            Some((_, sum)) => *sum += payment.amount,
            None => totals.push((payment.method, payment.amount)),
        }
    }
    totals
}

/// Most recent payment that still counts toward the balance.
pub fn last_active_payment(payments: &[Payment]) -> Option<&Payment> {
    payments.iter().rev().find(|payment| !payment.cancelled)
}
