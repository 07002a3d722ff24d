use std::sync::LazyLock;

use crate::perf::SpeedupSeries;

/// Speedups measured externally on a 16-core box, kept for comparison plots.
pub static MEASURED_THREADS: [u64; 9] = [1, 2, 4, 6, 8, 10, 12, 14, 16];
pub static MEASURED_SPEEDUP: [f64; 9] = [
    1.08068, 2.08742, 2.19584, 2.26718, 2.79783, 2.82797, 3.34951, 3.59085, 4.1749,
];

pub static MEASURED: LazyLock<SpeedupSeries> = LazyLock::new(|| {
    SpeedupSeries::from_points("measured", &MEASURED_THREADS, &MEASURED_SPEEDUP)
        .expect("measured dataset is well formed")
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn measured_dataset_is_well_formed() {
        let records = MEASURED.measurements();
        assert_eq!(records.len(), 9);
        assert!(records.iter().all(|m| m.speedup > 0.0));
        assert_eq!(records[0].thread_count, 1);
        assert_eq!(records[8].thread_count, 16);
        assert_eq!(records[8].speedup, 4.1749);
    }
}
