use crate::error::ValidationError;
use crate::models::{QuarterTargets, Settings};
use crate::utils::format_currency;

/// Fixed share of the annual target assigned to each fiscal quarter.
pub const QUARTER_PROPORTIONS: QuarterTargets = QuarterTargets {
    q1: 0.20,
    q2: 0.24,
    q3: 0.28,
    q4: 0.28,
};

const SUM_TOLERANCE: f64 = 1e-6;

/// Splits `annual_target` across quarters by the fixed proportions, rounded
/// to whole currency units.
pub fn quarters_for_annual_target(annual_target: f64) -> QuarterTargets {
    QuarterTargets {
        q1: (annual_target * QUARTER_PROPORTIONS.q1).round(),
        q2: (annual_target * QUARTER_PROPORTIONS.q2).round(),
        q3: (annual_target * QUARTER_PROPORTIONS.q3).round(),
        q4: (annual_target * QUARTER_PROPORTIONS.q4).round(),
    }
}

/// New settings for an annual target change. Quarterly targets are always
/// regenerated from the proportions.
pub fn set_annual_target(annual_target: f64) -> Result<Settings, ValidationError> {
    if !annual_target.is_finite() || annual_target < 0.0 {
        return Err(ValidationError::InvalidTarget);
    }
    Ok(Settings {
        annual_target,
        quarter_values: quarters_for_annual_target(annual_target),
    })
}

/// Accepts hand-edited quarterly targets only when they add up to the current
/// annual target.
pub fn set_quarterly_targets(
    current: &Settings,
    inputs: QuarterTargets,
) -> Result<Settings, ValidationError> {
    let values = [inputs.q1, inputs.q2, inputs.q3, inputs.q4];
    if values.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(ValidationError::InvalidTarget);
    }
    if !sums_to_annual_target(&inputs, current.annual_target) {
        return Err(ValidationError::QuarterSumMismatch {
            total: format_currency(inputs.total()),
            annual_target: format_currency(current.annual_target),
        });
    }
    Ok(Settings {
        annual_target: current.annual_target,
        quarter_values: inputs,
    })
}

pub fn sums_to_annual_target(quarters: &QuarterTargets, annual_target: f64) -> bool {
    (quarters.total() - annual_target).abs() <= SUM_TOLERANCE
}
