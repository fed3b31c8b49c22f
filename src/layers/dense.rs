//! Dense (fully connected) layer implementation
//!
//! Performs the transformation: output = input × weights + biases

use crate::layers::Layer;
use rand::Rng;

/// Dense (fully connected) layer with weights and biases.
///
/// Performs the linear transformation: y = xW + b
/// where x is the input (batch_size × input_size),
/// W is the weight matrix (input_size × output_size, row-major),
/// and b is the bias vector (output_size).
///
/// Gradients from the last backward pass are kept next to the parameters.
/// Cloning a layer copies parameters and gradients.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer {
    input_size: usize,
    output_size: usize,
    weights: Vec<f32>,
    biases: Vec<f32>,
    weight_grads: Vec<f32>,
    bias_grads: Vec<f32>,
}

impl DenseLayer {
    /// Create a new DenseLayer with Xavier initialization.
    ///
    /// Weights are sampled uniformly from [-limit, limit] where
    /// limit = sqrt(6 / (input_size + output_size)). Biases start at zero.
    ///
    /// # Example
    ///
    /// ```
    /// use lr_finder::layers::{DenseLayer, Layer};
    /// use rand::{rngs::StdRng, SeedableRng};
    ///
    /// let mut rng = StdRng::seed_from_u64(42);
    /// let layer = DenseLayer::new(128, 64, &mut rng);
    /// assert_eq!(layer.parameter_count(), 128 * 64 + 64);
    /// ```
    pub fn new<R: Rng + ?Sized>(input_size: usize, output_size: usize, rng: &mut R) -> Self {
        let limit = (6.0f32 / (input_size + output_size) as f32).sqrt();
        let weights = (0..input_size * output_size)
            .map(|_| rng.random_range(-limit..=limit))
            .collect();

        Self {
            input_size,
            output_size,
            weights,
            biases: vec![0.0; output_size],
            weight_grads: vec![0.0; input_size * output_size],
            bias_grads: vec![0.0; output_size],
        }
    }

    /// Row-major `input_size x output_size` weight matrix.
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    pub fn biases(&self) -> &[f32] {
        &self.biases
    }

    /// Gradients from the last `backward`, averaged over the batch.
    pub fn weight_grads(&self) -> &[f32] {
        &self.weight_grads
    }

    pub fn bias_grads(&self) -> &[f32] {
        &self.bias_grads
    }
}

impl Layer for DenseLayer {
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize) {
        assert_eq!(input.len(), batch_size * self.input_size, "dense input size mismatch");
        assert_eq!(output.len(), batch_size * self.output_size, "dense output size mismatch");

        for (x, y) in input
            .chunks_exact(self.input_size)
            .zip(output.chunks_exact_mut(self.output_size))
        {
            y.copy_from_slice(&self.biases);
            for (&xi, w_row) in x.iter().zip(self.weights.chunks_exact(self.output_size)) {
                for (yj, &wij) in y.iter_mut().zip(w_row) {
                    *yj += xi * wij;
                }
            }
        }
    }

    fn backward(
        &mut self,
        input: &[f32],
        grad_output: &[f32],
        grad_input: &mut [f32],
        batch_size: usize,
    ) {
        assert_eq!(input.len(), batch_size * self.input_size, "dense input size mismatch");
        assert_eq!(
            grad_output.len(),
            batch_size * self.output_size,
            "dense grad_output size mismatch"
        );
        assert_eq!(grad_input.len(), input.len(), "dense grad_input size mismatch");

        self.zero_grad();

        for ((x, dy), dx) in input
            .chunks_exact(self.input_size)
            .zip(grad_output.chunks_exact(self.output_size))
            .zip(grad_input.chunks_exact_mut(self.input_size))
        {
            for (bg, &g) in self.bias_grads.iter_mut().zip(dy) {
                *bg += g;
            }

            for (i, (&xi, dxi)) in x.iter().zip(dx.iter_mut()).enumerate() {
                let row = i * self.output_size..(i + 1) * self.output_size;
                let w_row = &self.weights[row.clone()];
                let wg_row = &mut self.weight_grads[row];

                let mut acc = 0.0f32;
                for ((wg, &w), &g) in wg_row.iter_mut().zip(w_row).zip(dy) {
                    *wg += xi * g;
                    acc += w * g;
                }
                *dxi = acc;
            }
        }
    }

    fn param_groups(&mut self) -> Vec<(&mut [f32], &[f32])> {
        vec![
            (&mut self.weights[..], &self.weight_grads[..]),
            (&mut self.biases[..], &self.bias_grads[..]),
        ]
    }

    fn param_group_sizes(&self) -> Vec<usize> {
        vec![self.weights.len(), self.biases.len()]
    }

    fn zero_grad(&mut self) {
        self.weight_grads.iter_mut().for_each(|g| *g = 0.0);
        self.bias_grads.iter_mut().for_each(|g| *g = 0.0);
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn output_size(&self) -> usize {
        self.output_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn layer_with(weights: Vec<f32>, biases: Vec<f32>, input_size: usize) -> DenseLayer {
        let output_size = biases.len();
        DenseLayer {
            input_size,
            output_size,
            weight_grads: vec![0.0; weights.len()],
            bias_grads: vec![0.0; output_size],
            weights,
            biases,
        }
    }

    #[test]
    fn test_xavier_initialization() {
        let mut rng = StdRng::seed_from_u64(42);
        let layer = DenseLayer::new(100, 50, &mut rng);

        let limit = (6.0f32 / 150.0).sqrt();
        for &weight in &layer.weights {
            assert!(weight >= -limit && weight <= limit);
        }
        assert!(layer.biases.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_deterministic_initialization() {
        let layer1 = DenseLayer::new(10, 5, &mut StdRng::seed_from_u64(7));
        let layer2 = DenseLayer::new(10, 5, &mut StdRng::seed_from_u64(7));
        assert_eq!(layer1, layer2);
    }

    #[test]
    fn test_forward_known_values() {
        // W = [[1, 2], [3, 4]], b = [0.5, -0.5]
        let layer = layer_with(vec![1.0, 2.0, 3.0, 4.0], vec![0.5, -0.5], 2);
        let mut output = vec![0.0; 4];
        layer.forward(&[1.0, 1.0, 2.0, 0.0], &mut output, 2);

        assert_eq!(output, vec![4.5, 5.5, 2.5, 3.5]);
    }

    #[test]
    fn test_backward_known_values() {
        let mut layer = layer_with(vec![1.0, 2.0, 3.0, 4.0], vec![0.0, 0.0], 2);
        let input = [1.0, 2.0];
        let mut grad_input = vec![0.0; 2];
        layer.backward(&input, &[1.0, -1.0], &mut grad_input, 1);

        // dW = x^T dy, db = dy, dx = dy W^T
        assert_eq!(layer.weight_grads(), &[1.0, -1.0, 2.0, -2.0]);
        assert_eq!(layer.bias_grads(), &[1.0, -1.0]);
        assert_eq!(grad_input, vec![-1.0, -1.0]);
    }

    #[test]
    fn test_backward_replaces_previous_gradients() {
        let mut layer = layer_with(vec![1.0, 1.0], vec![0.0], 2);
        let mut grad_input = vec![0.0; 2];
        layer.backward(&[1.0, 1.0], &[3.0], &mut grad_input, 1);
        layer.backward(&[1.0, 1.0], &[1.0], &mut grad_input, 1);

        assert_eq!(layer.bias_grads(), &[1.0]);
    }

    #[test]
    fn test_param_groups_order() {
        let mut layer = DenseLayer::new(3, 2, &mut StdRng::seed_from_u64(1));
        assert_eq!(layer.param_group_sizes(), vec![6, 2]);

        let groups = layer.param_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.len(), 6);
        assert_eq!(groups[1].1.len(), 2);
    }
}
