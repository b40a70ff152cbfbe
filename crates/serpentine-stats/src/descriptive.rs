/// Descriptive statistics summarizing a dataset.
///
/// The standard deviation is the *population* standard deviation (divides by `n`),
/// which is what the robustness score uses when ranking agents across seeds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptiveStats {
    /// Number of values in the dataset.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean of the dataset.
    pub mean: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from values in any order.
    ///
    /// Values are summed in iteration order, so the result is deterministic for a
    /// given input sequence.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use serpentine_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::new([5.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    ///
    /// assert!(DescriptiveStats::new(std::iter::empty()).is_none());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values = values.into_iter().collect::<Vec<_>>();
        let first = *values.first()?;

        let (min, max, sum) = values
            .iter()
            .fold((first, first, 0.0), |(min, max, sum), &v| {
                (f64::min(min, v), f64::max(max, v), sum + v)
            });
        let n = values.len() as f64;
        let mean = sum / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

        Some(Self {
            count: values.len(),
            min,
            max,
            mean,
            variance,
            std_dev: variance.sqrt(),
        })
    }

    /// Returns the mean of the values, or `0.0` for an empty dataset.
    #[must_use]
    pub fn mean_or_zero<I>(values: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        Self::new(values).map_or(0.0, |s| s.mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_value_has_zero_spread() {
        let stats = DescriptiveStats::new([42.0]).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.min, 42.0);
        assert_eq!(stats.max, 42.0);
        assert_eq!(stats.mean, 42.0);
        assert_eq!(stats.std_dev, 0.0);
    }

    #[test]
    fn test_population_std_dev() {
        let stats = DescriptiveStats::new([10.0, 20.0, 30.0]).unwrap();
        assert_eq!(stats.mean, 20.0);
        let expected = (200.0_f64 / 3.0).sqrt();
        assert!((stats.std_dev - expected).abs() < 1e-12);
    }

    #[test]
    fn test_negative_values() {
        let stats = DescriptiveStats::new([-4.0, 2.0, -1.0]).unwrap();
        assert_eq!(stats.min, -4.0);
        assert_eq!(stats.max, 2.0);
        assert_eq!(stats.mean, -1.0);
    }

    #[test]
    fn test_mean_or_zero() {
        assert_eq!(DescriptiveStats::mean_or_zero([1.0, 2.0, 3.0]), 2.0);
        assert_eq!(DescriptiveStats::mean_or_zero(Vec::new()), 0.0);
    }
}
