//! Layer trait definition
//!
//! Layers compute forward and backward passes on flat row-major f32 buffers and
//! expose their parameters together with the matching gradients, so an external
//! optimizer (one per parameter buffer) can apply the update.

/// Core trait for layers.
///
/// # Example
///
/// ```ignore
/// let mut output = vec![0.0f32; batch_size * output_size];
/// layer.forward(&input, &mut output, batch_size);
///
/// let mut grad_input = vec![0.0f32; batch_size * input_size];
/// layer.backward(&input, &grad_output, &mut grad_input, batch_size);
///
/// for ((params, grads), optimizer) in layer.param_groups().into_iter().zip(&mut optimizers) {
///     optimizer.update(params, grads);
/// }
/// ```
pub trait Layer {
    /// Forward propagation.
    ///
    /// * `input` - batch_size × input_size
    /// * `output` - batch_size × output_size, overwritten
    ///
    /// # Panics
    ///
    /// Implementations panic if the buffer sizes don't match the layer shape.
    fn forward(&self, input: &[f32], output: &mut [f32], batch_size: usize);

    /// Backward propagation.
    ///
    /// Writes the gradient with respect to the input into `grad_input` and
    /// stores the parameter gradients inside the layer, replacing those of any
    /// previous backward pass. `grad_output` is expected to already carry the
    /// batch averaging of the loss.
    fn backward(
        &mut self,
        input: &[f32],
        grad_output: &[f32],
        grad_input: &mut [f32],
        batch_size: usize,
    );

    /// Parameter buffers paired with their current gradients, in a fixed order.
    fn param_groups(&mut self) -> Vec<(&mut [f32], &[f32])>;

    /// Sizes of the parameter buffers, in the same order as `param_groups`.
    fn param_group_sizes(&self) -> Vec<usize>;

    /// Clear stored gradients.
    fn zero_grad(&mut self);

    fn input_size(&self) -> usize;

    fn output_size(&self) -> usize;

    /// Total count of trainable parameters.
    fn parameter_count(&self) -> usize {
        self.param_group_sizes().iter().sum()
    }
}
