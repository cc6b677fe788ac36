use crate::layers::dense::LayerGradients;
use crate::network::network::Network;

/// SGD with classical momentum. The learning rate is supplied per step so
/// the schedule can live outside the optimizer.
pub struct Sgd {
    pub momentum: f64,
    velocity: Vec<LayerGradients>,
}

impl Sgd {
    pub fn new(momentum: f64) -> Sgd {
        Sgd { momentum, velocity: Vec::new() }
    }

    /// Drops accumulated velocity; called whenever parameters are replaced.
    pub fn reset(&mut self) {
        self.velocity.clear();
    }

    /// Applies one update: v ← μ·v + g, w ← w − lr·v.
    pub fn step(&mut self, network: &mut Network, grads: &[LayerGradients], learning_rate: f64) {
        if self.velocity.len() != network.layers.len() {
            self.velocity = network.layers.iter().map(LayerGradients::zeros_like).collect();
        }
        for ((layer, v), g) in network.layers.iter_mut().zip(&mut self.velocity).zip(grads) {
            v.scale(self.momentum);
            v.accumulate(g);
            layer.weights.add_scaled(&v.weights, -learning_rate);
            layer.biases.add_scaled(&v.biases, -learning_rate);
        }
    }
}
