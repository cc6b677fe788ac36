use serde::{Deserialize, Serialize};

/// Element-wise activation applied after a layer's linear transform.
///
/// The super-resolver uses `LeakyReLU` in its hidden layers (a fixed-slope
/// stand-in for PReLU) and `Identity` on the residual output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivationFunction {
    Identity,
    ReLU,
    LeakyReLU { alpha: f64 },
    Tanh,
}

impl ActivationFunction {
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => x,
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Tanh => x.tanh(),
        }
    }

    /// Derivative with respect to the pre-activation `x`.
    pub fn derivative(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Identity => 1.0,
            ActivationFunction::ReLU => if x > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Tanh => {
                let t = x.tanh();
                1.0 - t * t
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaky_relu_keeps_negative_slope() {
        let act = ActivationFunction::LeakyReLU { alpha: 0.1 };
        assert_eq!(act.function(-2.0), -0.2);
        assert_eq!(act.derivative(-2.0), 0.1);
        assert_eq!(act.derivative(3.0), 1.0);
    }

    #[test]
    fn test_tanh_derivative_matches_finite_difference() {
        let act = ActivationFunction::Tanh;
        let h = 1e-6;
        let numeric = (act.function(0.3 + h) - act.function(0.3 - h)) / (2.0 * h);
        assert!((numeric - act.derivative(0.3)).abs() < 1e-6);
    }
}
