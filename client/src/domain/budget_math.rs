//! Budget totals pass.
//!
//! Pure arithmetic over a draft's phases: per-procedure cost totals, per
//! phase subtotals and the grand total. No rounding happens here; summation
//! runs on raw values and display code rounds at the boundary.

use shared::{Phase, Procedure};

/// Phases annotated with their totals, plus the budget grand total.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedTotals {
    pub phases: Vec<Phase>,
    pub total_general: f64,
}

/// Annotate `phases` with cost totals and compute the grand total.
///
/// Order is preserved and the input is never mutated. A phase with no
/// procedures totals 0, and an empty slice yields a grand total of 0.
/// Input validation (non-negative unit costs) is the caller's job.
pub fn calculate_totals(phases: &[Phase]) -> CalculatedTotals {
    let mut total_general = 0.0;

    let phases = phases
        .iter()
        .map(|phase| {
            let mut phase_total = 0.0;
            let procedures = phase
                .procedures
                .iter()
                .map(|procedure| {
                    let cost_total = f64::from(procedure.unit_count) * procedure.unit_cost;
                    phase_total += cost_total;
                    Procedure {
                        cost_total,
                        ..procedure.clone()
                    }
                })
                .collect();
            total_general += phase_total;
            Phase {
                procedures,
                total: phase_total,
                ..phase.clone()
            }
        })
        .collect();

    CalculatedTotals {
        phases,
        total_general,
    }
}
