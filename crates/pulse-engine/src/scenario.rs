//! Counterfactual blood-pressure prediction.
//!
//! A linear model over three lifestyle factors, with Monte Carlo
//! confidence bands from the coefficients' empirical standard errors.
//! The engine is a pure function of its inputs: trial count and RNG seed
//! are explicit configuration, so every prediction is reproducible.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

use pulse_core::{
    defaults, Error, FeasibilityTier, ImpactFactor, Result, ScenarioRequest, ScenarioResult,
};

/// Static per-factor model parameters.
#[derive(Debug, Clone, Copy)]
struct ImpactCoefficient {
    /// Systolic effect, mmHg per unit of the factor.
    coeff: f64,
    /// Empirical standard error of the coefficient.
    se: f64,
    /// Realistic rate of change, units per month of consistent effort.
    monthly_rate: f64,
    /// Days before the factor starts showing in blood pressure.
    lag_days: f64,
    /// Additional days to full effect, per unit of delta.
    ramp_days_per_unit: f64,
}

fn coefficient(factor: ImpactFactor) -> ImpactCoefficient {
    match factor {
        ImpactFactor::Vo2Max => ImpactCoefficient {
            coeff: defaults::VO2_COEFF,
            se: defaults::VO2_COEFF_SE,
            monthly_rate: defaults::VO2_MONTHLY_RATE,
            lag_days: defaults::VO2_LAG_DAYS,
            ramp_days_per_unit: defaults::VO2_RAMP_DAYS_PER_UNIT,
        },
        ImpactFactor::SleepHours => ImpactCoefficient {
            coeff: defaults::SLEEP_COEFF,
            se: defaults::SLEEP_COEFF_SE,
            monthly_rate: defaults::SLEEP_MONTHLY_RATE,
            lag_days: defaults::SLEEP_LAG_DAYS,
            ramp_days_per_unit: defaults::SLEEP_RAMP_DAYS_PER_UNIT,
        },
        ImpactFactor::Steps => ImpactCoefficient {
            coeff: defaults::STEPS_COEFF,
            se: defaults::STEPS_COEFF_SE,
            monthly_rate: defaults::STEPS_MONTHLY_RATE,
            lag_days: defaults::STEPS_LAG_DAYS,
            ramp_days_per_unit: defaults::STEPS_RAMP_DAYS_PER_UNIT,
        },
    }
}

/// Scenario engine configuration.
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    /// Monte Carlo trial count for the confidence interval.
    pub trials: usize,
    /// Diastolic delta as a fraction of the systolic delta.
    pub diastolic_ratio: f64,
    /// RNG seed; fixed so repeated predictions agree.
    pub seed: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            trials: defaults::SCENARIO_TRIALS,
            diastolic_ratio: defaults::DIASTOLIC_RATIO,
            seed: 0,
        }
    }
}

/// Pure counterfactual predictor. No I/O, no hidden state.
#[derive(Debug, Clone, Default)]
pub struct ScenarioEngine {
    config: ScenarioConfig,
}

impl ScenarioEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ScenarioConfig) -> Self {
        Self { config }
    }

    /// Predict the BP change for a scenario request.
    pub fn predict(&self, request: &ScenarioRequest) -> Result<ScenarioResult> {
        if self.config.trials == 0 {
            return Err(Error::InvalidInput(
                "scenario trial count must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.config.diastolic_ratio) {
            return Err(Error::Config(format!(
                "diastolic ratio {} outside [0, 1]",
                self.config.diastolic_ratio
            )));
        }

        let systolic_delta: f64 = request
            .deltas()
            .iter()
            .map(|&(factor, delta)| coefficient(factor).coeff * delta)
            .sum();
        let diastolic_delta = systolic_delta * self.config.diastolic_ratio;
        let predicted_systolic = request.baseline_systolic + systolic_delta;

        let confidence_interval = self.sample_interval(request)?;
        let feasibility = feasibility_tier(request);
        let timeline_days = timeline_days(request);

        debug!(
            subsystem = "engine",
            op = "predict",
            systolic_delta,
            feasibility = %feasibility,
            timeline_days,
            "Scenario predicted"
        );

        Ok(ScenarioResult {
            systolic_delta,
            diastolic_delta,
            predicted_systolic,
            confidence_interval,
            feasibility,
            timeline_days,
        })
    }

    /// 2.5/97.5 percentile band of the systolic delta under coefficient
    /// uncertainty.
    fn sample_interval(&self, request: &ScenarioRequest) -> Result<(f64, f64)> {
        let active: Vec<(ImpactCoefficient, f64)> = request
            .deltas()
            .iter()
            .filter(|(_, delta)| *delta != 0.0)
            .map(|&(factor, delta)| (coefficient(factor), delta))
            .collect();

        if active.is_empty() {
            return Ok((0.0, 0.0));
        }

        let distributions: Vec<(Normal<f64>, f64)> = active
            .iter()
            .map(|(c, delta)| {
                Normal::new(c.coeff, c.se)
                    .map(|n| (n, *delta))
                    .map_err(|e| Error::Internal(format!("bad coefficient distribution: {}", e)))
            })
            .collect::<Result<_>>()?;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut samples: Vec<f64> = (0..self.config.trials)
            .map(|_| {
                distributions
                    .iter()
                    .map(|(normal, delta)| normal.sample(&mut rng) * delta)
                    .sum()
            })
            .collect();
        samples.sort_by(|a, b| a.total_cmp(b));

        let lo_idx = ((self.config.trials as f64) * 0.025) as usize;
        let hi_idx = (((self.config.trials as f64) * 0.975) as usize)
            .min(self.config.trials - 1);
        Ok((samples[lo_idx], samples[hi_idx]))
    }
}

/// Months of consistent effort the largest delta demands, mapped to a tier.
/// An out-of-range scenario is flagged infeasible, never silently clipped.
fn feasibility_tier(request: &ScenarioRequest) -> FeasibilityTier {
    let months = request
        .deltas()
        .iter()
        .filter(|(_, delta)| *delta != 0.0)
        .map(|&(factor, delta)| delta.abs() / coefficient(factor).monthly_rate)
        .fold(0.0f64, f64::max);

    if months <= defaults::FEASIBILITY_HIGH_MONTHS {
        FeasibilityTier::High
    } else if months <= defaults::FEASIBILITY_MODERATE_MONTHS {
        FeasibilityTier::Moderate
    } else if months <= defaults::FEASIBILITY_LOW_MONTHS {
        FeasibilityTier::Low
    } else {
        FeasibilityTier::Infeasible
    }
}

/// Days until the full effect is expected: the slowest factor's lag plus
/// its ramp to the requested delta.
fn timeline_days(request: &ScenarioRequest) -> f64 {
    request
        .deltas()
        .iter()
        .filter(|(_, delta)| *delta != 0.0)
        .map(|&(factor, delta)| {
            let c = coefficient(factor);
            c.lag_days + c.ramp_days_per_unit * delta.abs()
        })
        .fold(0.0f64, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> ScenarioEngine {
        ScenarioEngine::new()
    }

    #[test]
    fn vo2_point_estimate_matches_coefficient() {
        let result = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 5.0,
                ..Default::default()
            })
            .unwrap();

        assert!((result.systolic_delta - (-9.8)).abs() < 1e-9);
        assert!((result.predicted_systolic - 132.2).abs() < 1e-9);
        assert!((result.diastolic_delta - (-4.9)).abs() < 1e-9);
    }

    #[test]
    fn interval_brackets_point_estimate() {
        let result = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 5.0,
                sleep_delta: 1.0,
                ..Default::default()
            })
            .unwrap();

        let (lo, hi) = result.confidence_interval;
        assert!(lo < result.systolic_delta);
        assert!(hi > result.systolic_delta);
    }

    #[test]
    fn interval_width_grows_with_active_factors() {
        let one = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 2.0,
                ..Default::default()
            })
            .unwrap();
        let two = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 2.0,
                sleep_delta: 1.0,
                ..Default::default()
            })
            .unwrap();
        let three = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 2.0,
                sleep_delta: 1.0,
                steps_delta: 2_000.0,
                ..Default::default()
            })
            .unwrap();

        let width = |r: &ScenarioResult| r.confidence_interval.1 - r.confidence_interval.0;
        assert!(width(&one) <= width(&two));
        assert!(width(&two) <= width(&three));
    }

    #[test]
    fn no_deltas_yield_degenerate_interval() {
        let result = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.systolic_delta, 0.0);
        assert_eq!(result.confidence_interval, (0.0, 0.0));
        assert_eq!(result.timeline_days, 0.0);
    }

    #[test]
    fn predictions_are_reproducible() {
        let request = ScenarioRequest {
            baseline_systolic: 142.0,
            vo2_delta: 3.0,
            sleep_delta: 0.5,
            ..Default::default()
        };
        let a = engine().predict(&request).unwrap();
        let b = engine().predict(&request).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_move_the_interval() {
        let request = ScenarioRequest {
            baseline_systolic: 142.0,
            vo2_delta: 3.0,
            ..Default::default()
        };
        let a = ScenarioEngine::with_config(ScenarioConfig {
            seed: 1,
            ..Default::default()
        })
        .predict(&request)
        .unwrap();
        let b = ScenarioEngine::with_config(ScenarioConfig {
            seed: 2,
            ..Default::default()
        })
        .predict(&request)
        .unwrap();

        assert_ne!(a.confidence_interval, b.confidence_interval);
        // The point estimate is analytic, untouched by the seed.
        assert_eq!(a.systolic_delta, b.systolic_delta);
    }

    #[test]
    fn feasibility_tiers_follow_monthly_rates() {
        let tier = |vo2: f64| {
            engine()
                .predict(&ScenarioRequest {
                    baseline_systolic: 142.0,
                    vo2_delta: vo2,
                    ..Default::default()
                })
                .unwrap()
                .feasibility
        };

        // 1 point/month feasible rate.
        assert_eq!(tier(1.0), FeasibilityTier::High);
        assert_eq!(tier(3.0), FeasibilityTier::Moderate);
        assert_eq!(tier(6.0), FeasibilityTier::Low);
        assert_eq!(tier(10.0), FeasibilityTier::Infeasible);
    }

    #[test]
    fn infeasible_is_flagged_not_clipped() {
        let result = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 20.0,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(result.feasibility, FeasibilityTier::Infeasible);
        // The prediction itself still reflects the requested delta.
        assert!((result.systolic_delta - (-39.2)).abs() < 1e-9);
    }

    #[test]
    fn timeline_takes_slowest_factor() {
        let result = engine()
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 2.0,
                sleep_delta: 1.0,
                ..Default::default()
            })
            .unwrap();

        // VO2: 14 + 30*2 = 74 days; sleep: 3 + 7*1 = 10 days.
        assert!((result.timeline_days - 74.0).abs() < 1e-9);
    }

    #[test]
    fn zero_trials_is_rejected() {
        let engine = ScenarioEngine::with_config(ScenarioConfig {
            trials: 0,
            ..Default::default()
        });
        assert!(engine
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                vo2_delta: 1.0,
                ..Default::default()
            })
            .is_err());
    }

    #[test]
    fn bad_diastolic_ratio_is_rejected() {
        let engine = ScenarioEngine::with_config(ScenarioConfig {
            diastolic_ratio: 1.5,
            ..Default::default()
        });
        assert!(engine
            .predict(&ScenarioRequest {
                baseline_systolic: 142.0,
                ..Default::default()
            })
            .is_err());
    }
}
