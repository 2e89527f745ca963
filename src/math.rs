//! Small scalar helpers shared by the field kernels and the statistics.
use core::f64::consts::PI;

/// Cross product of two 3-vectors given by components.
#[inline]
pub fn cross3(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> (f64, f64, f64) {
    (
        y0.mul_add(z1, -z0 * y1),
        z0.mul_add(x1, -x0 * z1),
        x0.mul_add(y1, -y0 * x1),
    )
}

/// Dot product of two 3-vectors given by components.
#[inline]
pub fn dot3(x0: f64, y0: f64, z0: f64, x1: f64, y1: f64, z1: f64) -> f64 {
    x0.mul_add(x1, y0.mul_add(y1, z0 * z1))
}

/// Root-sum-square of three components.
#[inline]
pub fn rss3(x: f64, y: f64, z: f64) -> f64 {
    dot3(x, y, z, x, y, z).sqrt()
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
/// A single point sits at `start`.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n - 1) as f64;
            (0..n).map(|i| step.mul_add(i as f64, start)).collect()
        }
    }
}

/// Grid spacing of a [`linspace`] with the same arguments; zero for fewer than two points.
pub fn linspace_step(start: f64, stop: f64, n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (stop - start) / (n - 1) as f64
    }
}

/// Population mean and standard deviation. `None` for an empty slice.
pub fn mean_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some((mean, var.sqrt()))
}

/// Arithmetic-geometric mean iteration shared by [`ellipk`] and [`ellipe`].
///
/// Returns the converged mean and the weighted sum `sum(2^(n-1) c_n^2)`.
fn agm(m: f64) -> (f64, f64) {
    let mut a = 1.0;
    let mut b = (1.0 - m).sqrt();
    let mut weight = 0.5;
    let mut sum = 0.5 * m;
    for _ in 0..40 {
        let c = 0.5 * (a - b);
        let a_next = 0.5 * (a + b);
        b = (a * b).sqrt();
        a = a_next;
        weight *= 2.0;
        sum = (weight * c).mul_add(c, sum);
        if c.abs() < 1e-17 {
            break;
        }
    }
    (a, sum)
}

/// Complete elliptic integral of the first kind, K(m), with parameter `m = k^2`
/// (the scipy convention). Diverges as `m -> 1`.
pub fn ellipk(m: f64) -> f64 {
    let (a, _) = agm(m);
    PI / (2.0 * a)
}

/// Complete elliptic integral of the second kind, E(m), with parameter `m = k^2`.
pub fn ellipe(m: f64) -> f64 {
    if m >= 1.0 {
        return 1.0;
    }
    let (a, sum) = agm(m);
    (PI / (2.0 * a)) * (1.0 - sum)
}
