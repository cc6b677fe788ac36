use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{activation::activation::ActivationFunction, math::matrix::Matrix};

/// Fully connected layer. Weights are (input_size, size).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    pub size: usize,
    pub weights: Matrix,
    pub biases: Matrix,
    pub activator: ActivationFunction,
    // Activations cached by the last forward pass; not persisted.
    #[serde(skip)]
    input: Vec<f64>,
    #[serde(skip)]
    pre_neurons: Vec<f64>,
}

/// Per-layer gradients produced by one backward pass.
#[derive(Debug, Clone)]
pub struct LayerGradients {
    pub weights: Matrix,
    pub biases: Matrix,
}

impl LayerGradients {
    pub fn zeros_like(layer: &Layer) -> LayerGradients {
        LayerGradients {
            weights: Matrix::zeros(layer.weights.rows, layer.weights.cols),
            biases: Matrix::zeros(layer.biases.rows, layer.biases.cols),
        }
    }

    pub fn accumulate(&mut self, other: &LayerGradients) {
        self.weights.add_assign(&other.weights);
        self.biases.add_assign(&other.biases);
    }

    pub fn scale(&mut self, factor: f64) {
        self.weights.scale(factor);
        self.biases.scale(factor);
    }
}

impl Layer {
    /// He-initialized weights, zero biases. `gain` scales the weights
    /// (1.0 for hidden layers).
    pub fn new<R: Rng + ?Sized>(
        size: usize,
        input_size: usize,
        activation: ActivationFunction,
        gain: f64,
        rng: &mut R,
    ) -> Layer {
        Layer {
            size,
            weights: Matrix::he_scaled(input_size, size, gain, rng),
            biases: Matrix::zeros(1, size),
            activator: activation,
            input: Vec::new(),
            pre_neurons: Vec::new(),
        }
    }

    pub fn input_size(&self) -> usize {
        self.weights.rows
    }

    pub fn parameter_count(&self) -> usize {
        self.weights.data.len() + self.biases.data.len()
    }

    /// Inference forward pass; caches the pre-activation only.
    pub fn feed_from(&mut self, input: Vec<f64>) -> Vec<f64> {
        let mut z = Matrix::row(input).matmul(&self.weights);
        z.add_assign(&self.biases);
        let a = z.data.iter().map(|&x| self.activator.function(x)).collect();
        self.input.clear();
        self.pre_neurons = z.data;
        a
    }

    /// Like `feed_from` but keeps the input for the gradient computation.
    pub fn feed_train(&mut self, input: Vec<f64>) -> Vec<f64> {
        let out = self.feed_from(input.clone());
        self.input = input;
        out
    }

    /// Computes this layer's gradients from ∂L/∂a (error in activation space)
    /// and returns them with ∂L/∂input for the previous layer.
    pub fn backward(&self, output_error: &[f64]) -> (LayerGradients, Vec<f64>) {
        // δ = error ⊙ σ'(z), using the cached pre-activation.
        let delta: Vec<f64> = output_error
            .iter()
            .zip(&self.pre_neurons)
            .map(|(e, &z)| e * self.activator.derivative(z))
            .collect();

        let weights = Matrix::outer(&self.input, &delta);
        let input_error = Matrix::row(delta.clone())
            .matmul(&self.weights.transpose())
            .data;

        (
            LayerGradients { weights, biases: Matrix::row(delta) },
            input_error,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn identity_layer() -> Layer {
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        let mut layer = Layer::new(2, 2, ActivationFunction::Identity, 1.0, &mut rng);
        layer.weights = Matrix { rows: 2, cols: 2, data: vec![1.0, 2.0, 3.0, 4.0] };
        layer.biases = Matrix::row(vec![0.5, -0.5]);
        layer
    }

    #[test]
    fn test_forward_is_affine_for_identity() {
        let mut layer = identity_layer();
        assert_eq!(layer.feed_from(vec![1.0, 1.0]), vec![4.5, 5.5]);
    }

    #[test]
    fn test_backward_shapes_and_values() {
        let mut layer = identity_layer();
        layer.feed_train(vec![1.0, 2.0]);
        let (grads, input_error) = layer.backward(&[1.0, 0.0]);

        assert_eq!(grads.weights.data, vec![1.0, 0.0, 2.0, 0.0]);
        assert_eq!(grads.biases.data, vec![1.0, 0.0]);
        // ∂L/∂x = δ · Wᵀ
        assert_eq!(input_error, vec![1.0, 3.0]);
    }

    #[test]
    fn test_cached_activations_are_not_serialized() {
        let mut layer = identity_layer();
        layer.feed_train(vec![1.0, 2.0]);
        let json = serde_json::to_string(&layer).unwrap();
        assert!(!json.contains("pre_neurons"));
        let restored: Layer = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.weights, layer.weights);
    }
}
