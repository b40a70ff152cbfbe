//! Statistical helpers shared by the Serpentine crates.
//!
//! Training compares agents by the distribution of their episode scores, so the
//! only statistics needed are the classic summary measures: count, extremes, mean
//! and the population standard deviation.
//!
//! # Example
//!
//! ```
//! use serpentine_stats::descriptive::DescriptiveStats;
//!
//! let stats = DescriptiveStats::new([10.0, 20.0, 30.0]).unwrap();
//! assert_eq!(stats.mean, 20.0);
//! assert!((stats.std_dev - 8.164_965_8).abs() < 1e-6);
//! ```

pub mod descriptive;
