//! Streaming reductions over borrowed samples.
//!
//! Means are accumulated incrementally rather than as `sum / n`, so a run of
//! identical samples averages to exactly that sample.

use core::borrow::Borrow;
use num_traits::Float;

/// Fold `x` into the running mean `m` of `k` samples (`x` included).
#[inline]
fn push_mean<F: Float>(m: F, x: F, k: F) -> F {
    if x == m || (m.is_infinite() && x.is_finite()) {
        m
    } else {
        m + (x - m) / k
    }
}

///
/// Compute the mean of the signal, `y`
///
/// Return the mean and the number of points averaged. An empty signal has a
/// NaN mean.
///
/// ```
/// use approx::assert_relative_eq;
/// use ftag_rs::stats::mean;
///
/// let psd: [f64; 4] = [2., 4., 6., 8.];
/// assert_relative_eq!(5f64, mean(psd.iter()).0);
///
/// let noise = [0.1f64; 6];
/// assert_eq!((0.1, 6), mean(noise.iter()));
///
/// let y: &[f32] = &[];
/// assert!(mean::<_, f32>(y.iter()).0.is_nan());
/// ```
///
pub fn mean<YI, F>(y: YI) -> (F, usize)
where
    F: Float,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (m, _, count) = y.fold((F::zero(), F::zero(), 0usize), |(m, k, count), yi| {
        let k = k + F::one();
        (push_mean(m, *yi.borrow(), k), k, count + 1)
    });
    match count {
        0 => (F::nan(), 0),
        _ => (m, count),
    }
}

///
/// Compute the mean of `y`, skipping NaN entries.
///
/// Return the mean and the number of points averaged. Infinite values take
/// part in the mean. A sequence without any non-NaN entry yields `(NaN, 0)`.
///
/// ```
/// use approx::assert_relative_eq;
/// use ftag_rs::stats::nanmean;
///
/// let snr = [f64::NAN, 1.0, 3.0, f64::NAN];
/// let (m, n) = nanmean::<_, f64>(snr.iter());
/// assert_relative_eq!(2.0, m);
/// assert_eq!(2, n);
///
/// let edge = [f64::NAN, f64::NAN];
/// assert!(nanmean::<_, f64>(edge.iter()).0.is_nan());
/// ```
///
pub fn nanmean<YI, F>(y: YI) -> (F, usize)
where
    F: Float,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    mean(y.map(|yi| *yi.borrow()).filter(|yi: &F| !yi.is_nan()))
}

///
/// Compute the population variance of the signal, `y`
///
/// Single pass (Welford). Return the variance and the number of points
/// averaged.
///
/// ```
/// use approx::assert_relative_eq;
/// use ftag_rs::stats::variance;
///
/// let y: [f64; 5] = [1.,2.,3.,4.,5.];
/// assert_relative_eq!(2f64, variance(y.iter()).0);
/// ```
///
pub fn variance<YI, F>(y: YI) -> (F, usize)
where
    F: Float,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (_, m2, k, count) = y.fold(
        (F::zero(), F::zero(), F::zero(), 0usize),
        |(m, m2, k, count), yi| {
            let x = *yi.borrow();
            let k = k + F::one();
            let next = push_mean(m, x, k);
            (next, m2 + (x - m) * (x - next), k, count + 1)
        },
    );
    match count {
        0 => (F::nan(), 0),
        _ => (m2 / k, count),
    }
}

/// Population standard deviation of `y`, with the number of points.
///
/// ```
/// use approx::assert_relative_eq;
/// use ftag_rs::stats::stdev;
///
/// let y: [f64; 5] = [1.,2.,3.,4.,5.];
/// assert_relative_eq!(1.41421356237f64, stdev(y.iter()).0, max_relative = 1e-8);
/// ```
pub fn stdev<YI, F>(y: YI) -> (F, usize)
where
    F: Float,
    YI: Iterator,
    YI::Item: Borrow<F>,
{
    let (v, n) = variance(y);
    (v.sqrt(), n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mean_of_repeated_sample_is_that_sample() {
        for v in [0.1f64, 0.3, 3.3e-11, 7.0 / 3.0] {
            for n in 1..=16 {
                let y = vec![v; n];
                assert_eq!(mean(y.iter()), (v, n), "v={v} n={n}");
            }
        }
    }

    #[test]
    fn mean_follows_nan_and_infinity() {
        let (m, n) = mean::<_, f64>([1.0, 2.0, f64::NAN, 5.0].iter());
        assert!(m.is_nan());
        assert_eq!(n, 4);

        assert_eq!(mean::<_, f64>([f64::INFINITY, 1.0, 2.0].iter()).0, f64::INFINITY);
        assert_eq!(mean::<_, f64>([1.0, f64::NEG_INFINITY].iter()).0, f64::NEG_INFINITY);
        assert!(mean::<_, f64>([f64::INFINITY, f64::NEG_INFINITY].iter()).0.is_nan());
    }

    #[test]
    fn nanmean_skips_only_nan() {
        let (m, n) = nanmean::<_, f64>([1.0, 2.0, f64::NAN, 5.0].iter());
        assert_relative_eq!(m, 8.0 / 3.0, epsilon = 1e-12);
        assert_eq!(n, 3);

        let (m, n) = nanmean::<_, f32>([f32::INFINITY, 1.0, f32::NAN].iter());
        assert!(m.is_infinite());
        assert_eq!(n, 2);
    }

    #[test]
    fn spread_of_constant_is_zero() {
        let y = [0.7f64; 6];
        assert_eq!(variance(y.iter()), (0.0, 6));
        assert_eq!(stdev(y.iter()), (0.0, 6));

        let empty: [f64; 0] = [];
        let (s, n) = stdev::<_, f64>(empty.iter());
        assert!(s.is_nan());
        assert_eq!(n, 0);
    }

    #[test]
    fn variance_matches_two_pass_formula() {
        let y = [2.5f64, -1.0, 4.25, 0.125, 9.0, 3.0];
        let avg = y.iter().sum::<f64>() / y.len() as f64;
        let expected = y.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / y.len() as f64;
        assert_relative_eq!(variance::<_, f64>(y.iter()).0, expected, max_relative = 1e-12);
    }
}
