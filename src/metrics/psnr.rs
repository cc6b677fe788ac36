/// Peak signal-to-noise ratio in dB for a given MSE.
///
/// `mse <= 0` means a perfect reconstruction and yields `f64::INFINITY`
/// instead of an error.
pub fn psnr_from_mse(mse: f64, max_value: f64) -> f64 {
    if mse <= 0.0 {
        return f64::INFINITY;
    }
    20.0 * max_value.log10() - 10.0 * mse.log10()
}

/// MSE between two single-channel images of `width × height` pixels,
/// ignoring `border` pixels on every side. Super-resolved edges are
/// reconstructed from padded context, so they are not scored.
///
/// Returns `None` when the border swallows the whole image.
pub fn image_mse(
    reconstructed: &[f64],
    ground_truth: &[f64],
    width: usize,
    height: usize,
    border: usize,
) -> Option<f64> {
    debug_assert_eq!(reconstructed.len(), width * height);
    debug_assert_eq!(ground_truth.len(), width * height);

    if width <= 2 * border || height <= 2 * border {
        return None;
    }

    let mut total = 0.0;
    for y in border..height - border {
        let row = y * width;
        for x in border..width - border {
            let d = reconstructed[row + x] - ground_truth[row + x];
            total += d * d;
        }
    }
    let count = (width - 2 * border) * (height - 2 * border);
    Some(total / count as f64)
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
