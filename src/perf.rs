use std::error::Error;
use std::path::Path;

use serde::Serialize;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Measurement {
    pub name: &'static str,
    pub thread_count: u64,
    pub speedup: f64,
}

/// Speedup numbers keyed by thread count. `thread_count` and `speedup` are
/// positionally paired: index i of one belongs to index i of the other.
#[derive(Debug)]
pub struct SpeedupSeries(Vec<Measurement>);

impl SpeedupSeries {
    pub fn from_points(
        name: &'static str,
        threads: &[u64],
        speedup: &[f64],
    ) -> Result<Self, String> {
        if threads.len() != speedup.len() {
            return Err(format!(
                "{} thread counts but {} speedup values",
                threads.len(),
                speedup.len()
            ));
        }

        if threads.is_empty() {
            return Err("series is empty".to_string());
        }

        if threads[0] == 0 {
            return Err("thread counts must be positive".to_string());
        }

        for pair in threads.windows(2) {
            if pair[1] <= pair[0] {
                return Err(format!(
                    "thread counts must be strictly increasing: {} then {}",
                    pair[0], pair[1]
                ));
            }
        }

        for (&thread_count, &speedup) in threads.iter().zip(speedup) {
            if !speedup.is_finite() || speedup <= 0.0 {
                return Err(format!(
                    "speedup for {} threads is {}, expected a positive number",
                    thread_count, speedup
                ));
            }
        }

        Ok(Self(
            threads
                .iter()
                .zip(speedup)
                .map(|(&thread_count, &speedup)| Measurement {
                    name,
                    thread_count,
                    speedup,
                })
                .collect(),
        ))
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.0
    }
}

pub fn write_csv(records: &[Measurement], path: &Path) -> Result<(), Box<dyn Error>> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
