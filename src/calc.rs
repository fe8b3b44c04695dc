//! Harvest loss estimation.
//!
//! Loss is a flat fraction of total production chosen by harvest method.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::HarvestMethod;

pub const DEFAULT_MANUAL_LOSS: f64 = 0.05;
pub const DEFAULT_MECHANIZED_LOSS: f64 = 0.15;

/// Loss fractions per harvest method (0.05 = 5%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LossRates {
    pub manual: f64,
    pub mechanized: f64,
}

impl Default for LossRates {
    fn default() -> Self {
        Self {
            manual: DEFAULT_MANUAL_LOSS,
            mechanized: DEFAULT_MECHANIZED_LOSS,
        }
    }
}

impl LossRates {
    pub fn fraction(&self, method: HarvestMethod) -> f64 {
        match method {
            HarvestMethod::Manual => self.manual,
            HarvestMethod::Mechanized => self.mechanized,
        }
    }
}

/// Output of a loss computation, every figure rounded to 2 places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossEstimate {
    pub loss_pct: f64,
    pub loss_tons: f64,
    pub total_tons: f64,
}

/// Round to 2 decimal places, judged on the exact stored value: 1.005 is
/// really 1.00499.. and rounds down. Exact midpoints go to the even cent.
pub fn round2(value: f64) -> f64 {
    // Only odd eighths (x.125, x.375, ..) sit exactly between two cents, and
    // for those scaling by 100 is exact.
    let eighths = value * 8.0;
    if eighths.fract() == 0.0 && eighths % 2.0 != 0.0 && eighths.abs() < 1e15 {
        return (value * 100.0).round_ties_even() / 100.0;
    }
    format!("{:.2}", value).parse().unwrap_or(value)
}

/// Compute loss from a method name. Fails with `InvalidMethod` unless the
/// method is `manual` or `mechanized` (any case).
///
/// Yield and area are expected to be positive already.
pub fn compute(
    yield_t_per_ha: f64,
    area_ha: f64,
    method: &str,
    rates: &LossRates,
) -> Result<LossEstimate> {
    let method = method.parse::<HarvestMethod>()?;
    Ok(estimate(yield_t_per_ha, area_ha, method, rates))
}

pub fn estimate(
    yield_t_per_ha: f64,
    area_ha: f64,
    method: HarvestMethod,
    rates: &LossRates,
) -> LossEstimate {
    let fraction = rates.fraction(method);
    let total_tons = yield_t_per_ha * area_ha;
    let loss_tons = total_tons * fraction;

    LossEstimate {
        loss_pct: round2(fraction * 100.0),
        loss_tons: round2(loss_tons),
        total_tons: round2(total_tons),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_manual_rate() {
        let estimate = compute(5.0, 10.0, "manual", &LossRates::default()).unwrap();
        assert_eq!(
            estimate,
            LossEstimate {
                loss_pct: 5.0,
                loss_tons: 2.5,
                total_tons: 50.0,
            }
        );
    }

    #[test]
    fn test_mechanized_rate() {
        let estimate = compute(6.0, 8.0, "Mechanized", &LossRates::default()).unwrap();
        assert_eq!(estimate.loss_pct, 15.0);
        assert_eq!(estimate.loss_tons, 7.2);
        assert_eq!(estimate.total_tons, 48.0);
    }

    #[test]
    fn test_outputs_are_rounded() {
        let estimate = compute(4.321, 2.5, "manual", &LossRates::default()).unwrap();
        assert_eq!(estimate.total_tons, 10.8);
        assert_eq!(estimate.loss_tons, 0.54);
    }

    #[test]
    fn test_custom_rates() {
        let rates = LossRates {
            manual: 0.1,
            mechanized: 0.2,
        };
        let estimate = compute(10.0, 10.0, "mechanized", &rates).unwrap();
        assert_eq!(estimate.loss_pct, 20.0);
        assert_eq!(estimate.loss_tons, 20.0);
    }

    #[test]
    fn test_invalid_method() {
        for method in ["", "hand", "mecanica", "mechanised"] {
            let result = compute(1.0, 1.0, method, &LossRates::default());
            assert!(matches!(result, Err(Error::InvalidMethod(_))));
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(7.199999999999999), 7.2);
        assert_eq!(round2(864.0000000000001), 864.0);
        assert_eq!(round2(-1.005), -1.0);
    }

    #[test]
    fn test_round2_uses_the_stored_value() {
        // 0.015 is stored as 0.01499..
        assert_eq!(round2(0.015), 0.01);
        // 1640.00499..
        assert_eq!(round2(13.61 * 120.5), 1640.0);
        assert_eq!(round2(2.675), 2.67);
    }

    #[test]
    fn test_round2_exact_midpoints_go_to_even() {
        assert_eq!(round2(0.125), 0.12);
        assert_eq!(round2(0.375), 0.38);
        assert_eq!(round2(136.125), 136.12);
        assert_eq!(round2(-0.125), -0.12);
    }

    #[test]
    fn test_total_on_a_midpoint() {
        let estimate = compute(60.5, 2.25, "manual", &LossRates::default()).unwrap();
        assert_eq!(estimate.total_tons, 136.12);
    }
}
