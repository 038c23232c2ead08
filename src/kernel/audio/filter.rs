/// Gaussian low-pass over `values` with standard deviation `sigma` (in samples).
/// The kernel is truncated at 4 sigma and the edges are mirrored
/// (`d c b a | a b c d | d c b a`). A non-positive sigma returns the input.
pub fn gaussian_smooth(values: &[f64], sigma: f64) -> Vec<f64> {
    if values.is_empty() || !(sigma > 0.0) || !sigma.is_finite() {
        return values.to_vec();
    }

    let radius = (4.0 * sigma + 0.5) as usize;
    if radius == 0 {
        return values.to_vec();
    }

    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * (x / sigma).powi(2)).exp()
        })
        .collect();
    let total: f64 = kernel.iter().sum();
    for w in kernel.iter_mut() {
        *w /= total;
    }

    let n = values.len() as isize;
    (0..values.len())
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .map(|(k, w)| {
                    let j = i as isize + k as isize - radius as isize;
                    w * values[reflect(j, n)]
                })
                .sum()
        })
        .collect()
}

fn reflect(mut j: isize, n: isize) -> usize {
    // Period of the mirrored extension is 2n.
    let period = 2 * n;
    j = j.rem_euclid(period);
    if j >= n {
        j = period - 1 - j;
    }
    j as usize
}

/// Piecewise-linear resample of `values` onto `points` evenly spaced positions
/// spanning the first to the last input value.
pub fn resample_linear(values: &[f64], points: usize) -> Vec<f64> {
    match (values.len(), points) {
        (_, 0) => Vec::new(),
        (0, _) => vec![0.0; points],
        (1, _) => vec![values[0]; points],
        (_, 1) => vec![values[values.len() - 1]],
        (len, _) => {
            let scale = (len - 1) as f64 / (points - 1) as f64;
            (0..points)
                .map(|i| {
                    let x = i as f64 * scale;
                    let lo = (x.floor() as usize).min(len - 1);
                    let hi = (lo + 1).min(len - 1);
                    let frac = x - lo as f64;
                    values[lo] + (values[hi] - values[lo]) * frac
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothing_preserves_flat_signal() {
        let flat = vec![0.25; 50];
        for v in gaussian_smooth(&flat, 2.0) {
            assert!((v - 0.25).abs() < 1e-12);
        }
    }

    #[test]
    fn smoothing_spreads_a_spike() {
        let mut spike = vec![0.0; 21];
        spike[10] = 1.0;
        let out = gaussian_smooth(&spike, 1.5);
        assert!(out[10] < 1.0);
        assert!(out[9] > 0.0 && out[11] > 0.0);
        assert!((out[9] - out[11]).abs() < 1e-12);
        let mass: f64 = out.iter().sum();
        assert!((mass - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_sigma_is_identity() {
        let values = vec![1.0, 5.0, 2.0];
        assert_eq!(gaussian_smooth(&values, 0.0), values);
    }

    #[test]
    fn reflect_mirrors_edges() {
        assert_eq!(reflect(-1, 4), 0);
        assert_eq!(reflect(-2, 4), 1);
        assert_eq!(reflect(4, 4), 3);
        assert_eq!(reflect(5, 4), 2);
        assert_eq!(reflect(2, 4), 2);
    }

    #[test]
    fn resample_interpolates_between_points() {
        let out = resample_linear(&[0.0, 1.0], 5);
        assert_eq!(out, vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn resample_handles_degenerate_inputs() {
        assert_eq!(resample_linear(&[], 3), vec![0.0; 3]);
        assert_eq!(resample_linear(&[7.0], 2), vec![7.0, 7.0]);
        assert!(resample_linear(&[1.0, 2.0], 0).is_empty());
    }
}
