//! Formula engine for EM ground-conductivity readings.
//!
//! This module provides pure functions converting one raw instrument reading
//! into apparent conductivity, apparent resistivity and exploration depth.
//! The order of operations is fixed: identical inputs give bit-identical
//! outputs, and the intermediate terms are evaluated exactly as written
//! (e.g. `term2` is not algebraically simplified).

use crate::error::SurveyError;
use crate::models::Frequency;

const MILLIVOLTS_PER_VOLT: f64 = 1000.0;

/// Primary field coupling constant.
const PRIMARY_FIELD_COEFFICIENT: f64 = 0.00000232;

/// µ0·π, rounded.
const CONDUCTIVITY_COEFFICIENT: f64 = 0.0000039478;

/// Scales the conductivity to µS/cm.
const CONDUCTIVITY_SCALE: f64 = 100000000.0;

/// Converts 1/(µS/cm) to Ω·m.
const RESISTIVITY_SCALE: f64 = 10000.0;

/// Skin depth factor, 503 / 5.
const DEPTH_FACTOR: f64 = 503.0 / 5.0;

/// One raw reading plus the project parameters the formulas need.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormulaInput {
    pub frequency: Frequency,
    /// Transmitter current (A).
    pub tx_current: f64,
    /// Receiver voltage (mV).
    pub rx_voltage_mv: f64,
    /// Coil separation (m).
    pub intercoil: f64,
    /// Background resistivity (Ω·m).
    pub average_resistivity: f64,
}

/// Derived quantities for one reading.
#[derive(Debug, Clone, Copy, PartialEq, uniffi::Record)]
pub struct Calculation {
    /// Apparent conductivity (µS/cm)
    pub conductivity: f64,
    /// Apparent resistivity (Ω·m)
    pub resistivity: f64,
    /// Exploration depth (m), negative below surface
    pub depth: f64,
}

impl Calculation {
    /// Reject NaN or infinite outputs.
    pub fn ensure_finite(self, frequency: Frequency) -> Result<Self, SurveyError> {
        let checks = [
            ("conductivity", self.conductivity),
            ("resistivity", self.resistivity),
            ("depth", self.depth),
        ];
        for (quantity, value) in checks {
            if !value.is_finite() {
                return Err(SurveyError::NonFiniteResult {
                    quantity: quantity.to_string(),
                    frequency,
                });
            }
        }
        Ok(self)
    }
}

/// Normalised secondary field `Ht`.
pub fn field_ratio(rx_voltage_mv: f64, intercoil: f64) -> f64 {
    let rx_voltage_v = rx_voltage_mv / MILLIVOLTS_PER_VOLT;
    (100.0 * rx_voltage_v) / (4.0 * intercoil)
}

/// Apparent conductivity in µS/cm.
pub fn apparent_conductivity(frequency: Frequency, rx_voltage_mv: f64, intercoil: f64) -> f64 {
    let term1 = 2.0 * field_ratio(rx_voltage_mv, intercoil);
    let term2 = (PRIMARY_FIELD_COEFFICIENT * intercoil) / intercoil.powf(3.0);
    let numerator = term1 - term2;
    ((numerator / CONDUCTIVITY_COEFFICIENT) * frequency.hz() as f64 * intercoil.powf(2.0))
        / CONDUCTIVITY_SCALE
}

/// Apparent resistivity in Ω·m. Unguarded: zero conductivity yields infinity.
pub fn apparent_resistivity(conductivity: f64) -> f64 {
    (1.0 / conductivity) * RESISTIVITY_SCALE
}

/// Exploration depth in meters (negative below surface).
pub fn exploration_depth(frequency: Frequency, average_resistivity: f64) -> f64 {
    -DEPTH_FACTOR * (average_resistivity / frequency.hz() as f64).sqrt()
}

/// Apply all formulas without checking the result.
pub fn compute(input: &FormulaInput) -> Calculation {
    let conductivity =
        apparent_conductivity(input.frequency, input.rx_voltage_mv, input.intercoil);
    Calculation {
        conductivity,
        resistivity: apparent_resistivity(conductivity),
        depth: exploration_depth(input.frequency, input.average_resistivity),
    }
}

/// Apply all formulas, rejecting a zero transmitter current and non-finite results.
pub fn evaluate(input: &FormulaInput) -> Result<Calculation, SurveyError> {
    if !input.tx_current.is_finite() || input.tx_current == 0.0 {
        return Err(SurveyError::validation(
            "txCurrent",
            format!("must be a non-zero current at {}", input.frequency),
        ));
    }
    if !input.rx_voltage_mv.is_finite() {
        return Err(SurveyError::validation(
            "rxVoltage",
            format!("must be a finite voltage at {}", input.frequency),
        ));
    }
    compute(input).ensure_finite(input.frequency)
}

#[uniffi::export]
pub fn calculate_measurement(
    frequency: Frequency,
    tx_current: f64,
    rx_voltage_mv: f64,
    intercoil: f64,
    average_resistivity: f64,
) -> Result<Calculation, SurveyError> {
    evaluate(&FormulaInput {
        frequency,
        tx_current,
        rx_voltage_mv,
        intercoil,
        average_resistivity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(frequency: Frequency, rx_voltage_mv: f64) -> FormulaInput {
        FormulaInput {
            frequency,
            tx_current: 1.0,
            rx_voltage_mv,
            intercoil: 10.0,
            average_resistivity: 100.0,
        }
    }

    fn assert_relative(actual: f64, expected: f64, tolerance: f64) {
        let error = ((actual - expected) / expected).abs();
        assert!(
            error < tolerance,
            "expected {expected}, got {actual} (relative error {error})"
        );
    }

    #[test]
    fn test_worked_example() {
        assert!((field_ratio(50.0, 10.0) - 0.125).abs() < f64::EPSILON);

        let calc = evaluate(&input(Frequency::F813, 50.0)).unwrap();
        assert_relative(calc.conductivity, 51.48436626, 1e-6);
        assert_relative(calc.resistivity, 194.23372036, 1e-6);
        assert_relative(calc.depth, -35.28196038, 1e-6);
        assert_relative(calc.resistivity, 10000.0 / calc.conductivity, 1e-12);
    }

    #[test]
    fn test_deterministic() {
        for frequency in Frequency::ALL {
            let a = compute(&input(frequency, 37.25));
            let b = compute(&input(frequency, 37.25));
            assert_eq!(a.conductivity.to_bits(), b.conductivity.to_bits());
            assert_eq!(a.resistivity.to_bits(), b.resistivity.to_bits());
            assert_eq!(a.depth.to_bits(), b.depth.to_bits());
        }
    }

    #[test]
    fn test_intercoil_powers_use_pow() {
        // 1.2 * 1.2 * 1.2 rounds to 1.728, pow to the nearest double below it.
        assert_eq!(1.2f64.powf(3.0).to_bits(), 0x3ffb_a5e3_53f7_ced8);
        assert_eq!(
            apparent_conductivity(Frequency::F559, 0.01, 1.2).to_bits(),
            0x3f4b_bb4b_cbb2_e28b
        );
        assert_eq!(
            apparent_conductivity(Frequency::F102, 0.01, 1.2).to_bits(),
            0x3f24_3d98_ddf2_c393
        );
    }

    #[test]
    fn test_depth_sign_and_monotonicity() {
        assert_eq!(exploration_depth(Frequency::F813, 0.0), 0.0);

        let mut previous = 0.0;
        for frequency in Frequency::ALL {
            let depth = exploration_depth(frequency, 100.0);
            assert!(depth < previous, "{frequency} should reach deeper");
            previous = depth;
        }

        let shallow = exploration_depth(Frequency::F254, 10.0);
        let deep = exploration_depth(Frequency::F254, 1000.0);
        assert!(deep < shallow && shallow < 0.0);
    }

    #[test]
    fn test_conductivity_scales_with_frequency() {
        let high = apparent_conductivity(Frequency::F813, 50.0, 10.0);
        let low = apparent_conductivity(Frequency::F102, 50.0, 10.0);
        assert_relative(high / low, 813.0 / 102.0, 1e-12);
    }

    #[test]
    fn test_zero_intercoil_is_not_finite() {
        let mut bad = input(Frequency::F559, 20.0);
        bad.intercoil = 0.0;
        assert!(compute(&bad).conductivity.is_nan());
        assert_eq!(
            evaluate(&bad),
            Err(SurveyError::NonFiniteResult {
                quantity: "conductivity".to_string(),
                frequency: Frequency::F559,
            })
        );
    }

    #[test]
    fn test_zero_conductivity_resistivity() {
        assert!(apparent_resistivity(0.0).is_infinite());
        let calc = Calculation {
            conductivity: 0.0,
            resistivity: apparent_resistivity(0.0),
            depth: -10.0,
        };
        assert!(matches!(
            calc.ensure_finite(Frequency::F102),
            Err(SurveyError::NonFiniteResult { ref quantity, .. }) if quantity == "resistivity"
        ));
    }

    #[test]
    fn test_zero_current_rejected() {
        let mut bad = input(Frequency::F203, 20.0);
        bad.tx_current = 0.0;
        assert!(matches!(
            evaluate(&bad),
            Err(SurveyError::Validation { ref field, .. }) if field == "txCurrent"
        ));
    }

    #[test]
    fn test_calculate_measurement_export() {
        let calc = calculate_measurement(Frequency::F407, 1.2, 30.0, 10.0, 50.0).unwrap();
        let expected = compute(&FormulaInput {
            frequency: Frequency::F407,
            tx_current: 1.2,
            rx_voltage_mv: 30.0,
            intercoil: 10.0,
            average_resistivity: 50.0,
        });
        assert_eq!(calc, expected);
    }
}
