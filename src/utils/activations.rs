//! Activation and loss functions for the MLP unit
//!
//! - ReLU forward and backward (f32, in-place)
//! - Softmax applied row-wise
//! - Softmax cross-entropy returning the mean loss and its gradient

/// ReLU activation function applied in-place.
///
/// Sets all negative values to 0.0, keeps positive values unchanged.
pub fn relu_inplace(data: &mut [f32]) {
    for value in data.iter_mut() {
        if *value < 0.0 {
            *value = 0.0;
        }
    }
}

/// Backpropagates through a ReLU given its output activations.
///
/// Zeroes `grad` wherever the activation was not positive.
pub fn relu_backward_inplace(grad: &mut [f32], activations: &[f32]) {
    assert_eq!(grad.len(), activations.len(), "grad/activation length mismatch");
    for (g, &a) in grad.iter_mut().zip(activations) {
        if a <= 0.0 {
            *g = 0.0;
        }
    }
}

/// Softmax applied row-wise.
///
/// Converts logits to probabilities for each row. Uses the max-subtraction
/// trick for numerical stability to avoid overflow with large values.
///
/// # Arguments
/// * `outputs` - Flat array containing row-major matrix data
/// * `rows` - Number of rows in the matrix
/// * `cols` - Number of columns in the matrix
pub fn softmax_rows(outputs: &mut [f32], rows: usize, cols: usize) {
    if cols == 0 {
        return;
    }
    assert_eq!(outputs.len(), rows * cols, "outputs length mismatch in softmax_rows");

    for row in outputs.chunks_exact_mut(cols).take(rows) {
        let max_value = row.iter().copied().fold(f32::NEG_INFINITY, f32::max);

        let mut sum = 0.0f32;
        for value in row.iter_mut() {
            *value = (*value - max_value).exp();
            sum += *value;
        }

        let inv_sum = 1.0f32 / sum;
        for value in row.iter_mut() {
            *value *= inv_sum;
        }
    }
}

/// Mean softmax cross-entropy over a batch.
///
/// `logits` is turned into probabilities in place. `delta` receives the
/// gradient of the mean loss with respect to the logits, i.e.
/// `(p - onehot(label)) / rows`.
///
/// Non-finite logits are not special-cased: they flow through into the
/// probabilities, and a NaN probability clamps to the log floor.
pub fn softmax_cross_entropy(
    logits: &mut [f32],
    labels: &[usize],
    rows: usize,
    cols: usize,
    delta: &mut [f32],
) -> f32 {
    assert_eq!(labels.len(), rows, "one label per row expected");
    assert_eq!(delta.len(), rows * cols, "delta length mismatch");

    softmax_rows(logits, rows, cols);

    let epsilon = 1e-9f32;
    let inv_rows = 1.0 / rows as f32;
    let mut total_loss = 0.0f32;

    for (row_idx, &label) in labels.iter().enumerate() {
        let start = row_idx * cols;
        let probs = &logits[start..start + cols];
        total_loss -= probs[label].max(epsilon).ln();

        let delta_row = &mut delta[start..start + cols];
        for (j, (&p, d)) in probs.iter().zip(delta_row.iter_mut()).enumerate() {
            let target = if j == label { 1.0 } else { 0.0 };
            *d = (p - target) * inv_rows;
        }
    }

    total_loss * inv_rows
}
