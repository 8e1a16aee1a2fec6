//! Random sampling of parameter values.

use rand::Rng;
use tracing::{debug, warn};

use crate::error::PatternError;
use crate::pattern::Pattern;
use crate::spec::{ParamRange, ParamValue, Parameter};

/// Upper bound on sampling attempts per randomization.
pub const MAX_ATTEMPTS: usize = 100;

/// Values closer to zero than this are pushed out to it, keeping
/// multiplicative parameters invertible.
pub const MIN_MAGNITUDE: f64 = 1e-2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomizeOutcome {
    /// Samples drawn, including the accepted one.
    pub attempts: usize,
    /// True when every attempt produced an intersecting panel and the last
    /// sample was kept anyway.
    pub self_intersecting: bool,
}

/// Uniform value in `[low, high]`, kept away from zero.
pub fn new_value<R: Rng>(
    rng: &mut R,
    parameter: &str,
    [low, high]: [f64; 2],
) -> Result<f64, PatternError> {
    if !(low.is_finite() && high.is_finite()) || low > high {
        return Err(PatternError::InvalidRange {
            parameter: parameter.to_string(),
            message: format!("[{low}, {high}]"),
        });
    }
    let value = if low == high {
        low
    } else {
        rng.gen_range(low..=high)
    };
    if value.abs() < MIN_MAGNITUDE {
        return Ok(if value < 0.0 {
            -MIN_MAGNITUDE
        } else {
            MIN_MAGNITUDE
        });
    }
    Ok(value)
}

fn sample<R: Rng>(
    rng: &mut R,
    name: &str,
    parameter: &Parameter,
) -> Result<ParamValue, PatternError> {
    match (&parameter.range, parameter.neutral_value()) {
        (ParamRange::Single(range), ParamValue::Scalar(_)) => {
            Ok(ParamValue::Scalar(new_value(rng, name, *range)?))
        }
        (ParamRange::Single(range), ParamValue::List(values)) => values
            .iter()
            .map(|_| new_value(rng, name, *range))
            .collect::<Result<_, _>>()
            .map(ParamValue::List),
        (ParamRange::PerComponent(ranges), shape) => {
            if ranges.len() != shape.len() {
                return Err(PatternError::InvalidRange {
                    parameter: name.to_string(),
                    message: format!("{} ranges for {} values", ranges.len(), shape.len()),
                });
            }
            let values = ranges
                .iter()
                .map(|range| new_value(rng, name, *range))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(match (shape, values.as_slice()) {
                (ParamValue::Scalar(_), [value]) => ParamValue::Scalar(*value),
                _ => ParamValue::List(values),
            })
        }
    }
}

impl Pattern {
    /// Draw new values for every parameter from its range.
    fn randomize_parameters<R: Rng>(&mut self, rng: &mut R) -> Result<(), PatternError> {
        for (name, parameter) in self.spec.parameters.iter_mut() {
            parameter.value = Some(sample(rng, name, parameter)?);
        }
        Ok(())
    }

    /// Replace the parameter values with random ones and apply them,
    /// retrying while the result self-intersects.
    ///
    /// After [`MAX_ATTEMPTS`] the last sample is kept and reported through
    /// [`RandomizeOutcome::self_intersecting`]. On error the pattern is left
    /// as it was.
    pub fn randomize<R: Rng>(
        &mut self,
        rng: &mut R,
    ) -> Result<RandomizeOutcome, PatternError> {
        self.atomically(|pattern| {
            pattern.revert_to_template(false)?;
            let template = pattern.snapshot();

            for attempt in 1..=MAX_ATTEMPTS {
                if attempt > 1 {
                    pattern.restore(&template);
                }
                pattern.randomize_parameters(rng)?;
                pattern.update_pattern_by_param_values()?;

                if !pattern.is_self_intersecting() {
                    debug!(pattern = %pattern.name, attempt, "randomized");
                    return Ok(RandomizeOutcome {
                        attempts: attempt,
                        self_intersecting: false,
                    });
                }
                debug!(pattern = %pattern.name, attempt, "sample self-intersects; retrying");
            }

            warn!(
                pattern = %pattern.name,
                attempts = MAX_ATTEMPTS,
                "no valid sample found; keeping a self-intersecting pattern"
            );
            Ok(RandomizeOutcome {
                attempts: MAX_ATTEMPTS,
                self_intersecting: true,
            })
        })
    }
}
