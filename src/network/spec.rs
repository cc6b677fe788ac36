use serde::{Deserialize, Serialize};

use crate::activation::activation::ActivationFunction;

/// Describes one layer in a network specification.
///
/// Fields:
/// - `size`      : number of neurons in this layer
/// - `input_size`: output size of the previous layer, or the flattened
///                  low-resolution patch for the first layer
/// - `activation`: activation function applied after the linear transform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub size: usize,
    pub input_size: usize,
    pub activation: ActivationFunction,
}

/// Architecture of a patch super-resolver: a flattened `patch × patch`
/// low-resolution input mapped to a `(patch·scale)²` residual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub patch_size: u32,
    pub scale: u32,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

/// Negative slope of the hidden-layer activation.
const LEAKY_ALPHA: f64 = 0.1;

impl NetworkSpec {
    /// Hidden layers use LeakyReLU, the output layer is linear.
    pub fn for_patches(patch_size: u32, scale: u32, hidden: &[usize]) -> NetworkSpec {
        let input_size = (patch_size * patch_size) as usize;
        let output_size = input_size * (scale * scale) as usize;

        let mut layers = Vec::with_capacity(hidden.len() + 1);
        let mut prev = input_size;
        for &size in hidden {
            layers.push(LayerSpec {
                size,
                input_size: prev,
                activation: ActivationFunction::LeakyReLU { alpha: LEAKY_ALPHA },
            });
            prev = size;
        }
        layers.push(LayerSpec {
            size: output_size,
            input_size: prev,
            activation: ActivationFunction::Identity,
        });

        NetworkSpec { patch_size, scale, layers }
    }

    pub fn input_size(&self) -> usize {
        (self.patch_size * self.patch_size) as usize
    }

    pub fn output_size(&self) -> usize {
        self.input_size() * (self.scale * self.scale) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layers_chain_sizes() {
        let spec = NetworkSpec::for_patches(4, 2, &[32, 16]);
        let sizes: Vec<(usize, usize)> = spec.layers.iter().map(|l| (l.input_size, l.size)).collect();
        assert_eq!(sizes, vec![(16, 32), (32, 16), (16, 64)]);
        assert_eq!(spec.layers.last().unwrap().activation, ActivationFunction::Identity);
    }

    #[test]
    fn test_no_hidden_layers_is_linear_map() {
        let spec = NetworkSpec::for_patches(3, 3, &[]);
        assert_eq!(spec.layers.len(), 1);
        assert_eq!(spec.output_size(), 81);
    }
}
