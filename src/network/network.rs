use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::layers::dense::{Layer, LayerGradients};
use crate::network::spec::NetworkSpec;

/// Gain applied to the output layer's initial weights so an untrained
/// network predicts a near-zero residual (plain upscaling).
const OUTPUT_GAIN: f64 = 0.1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub spec: NetworkSpec,
    pub layers: Vec<Layer>,
}

impl Network {
    pub fn from_spec<R: Rng + ?Sized>(spec: NetworkSpec, rng: &mut R) -> Network {
        let last = spec.layers.len().saturating_sub(1);
        let layers = spec
            .layers
            .iter()
            .enumerate()
            .map(|(i, l)| {
                let gain = if i == last { OUTPUT_GAIN } else { 1.0 };
                Layer::new(l.size, l.input_size, l.activation, gain, rng)
            })
            .collect();
        Network { spec, layers }
    }

    /// Inference forward pass.
    pub fn forward(&mut self, input: Vec<f64>) -> Vec<f64> {
        let mut current = input;
        for layer in &mut self.layers {
            current = layer.feed_from(current);
        }
        current
    }

    /// Forward pass that keeps every layer input for `backward`.
    pub fn forward_train(&mut self, input: Vec<f64>) -> Vec<f64> {
        let mut current = input;
        for layer in &mut self.layers {
            current = layer.feed_train(current);
        }
        current
    }

    /// Backpropagates ∂L/∂output through the layers of the last
    /// `forward_train` call. Gradients are returned in layer order.
    pub fn backward(&self, output_error: Vec<f64>) -> Vec<LayerGradients> {
        let mut grads = Vec::with_capacity(self.layers.len());
        let mut error = output_error;
        for layer in self.layers.iter().rev() {
            let (g, input_error) = layer.backward(&error);
            grads.push(g);
            error = input_error;
        }
        grads.reverse();
        grads
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    /// RMS of each layer's weights; a cheap health signal for telemetry.
    pub fn weight_rms(&self) -> Vec<f64> {
        self.layers
            .iter()
            .map(|l| (l.weights.squared_norm() / l.weights.data.len().max(1) as f64).sqrt())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loss::mse::MseLoss;
    use rand::SeedableRng;

    fn small_network() -> Network {
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        Network::from_spec(NetworkSpec::for_patches(2, 2, &[5]), &mut rng)
    }

    #[test]
    fn test_forward_output_size() {
        let mut net = small_network();
        assert_eq!(net.forward(vec![0.5; 4]).len(), 16);
        assert_eq!(net.parameter_count(), 4 * 5 + 5 + 5 * 16 + 16);
    }

    #[test]
    fn test_backward_matches_numeric_gradient() {
        let mut net = small_network();
        let input = vec![0.2, -0.4, 0.9, 0.1];
        let target = vec![0.3; 16];

        let out = net.forward_train(input.clone());
        let grads = net.backward(MseLoss::derivative(&out, &target));

        let h = 1e-6;
        let mut plus = net.clone();
        plus.layers[0].weights.data[3] += h;
        let mut minus = net.clone();
        minus.layers[0].weights.data[3] -= h;
        let numeric = (MseLoss::loss(&plus.forward(input.clone()), &target)
            - MseLoss::loss(&minus.forward(input), &target))
            / (2.0 * h);

        assert!((numeric - grads[0].weights.data[3]).abs() < 1e-5);
    }
}
