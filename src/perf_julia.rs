use std::ops::{Add, Mul};
use std::sync::Barrier;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub const BYTES_PER_PIXEL: usize = 4;

const SCALE: f32 = 1.5;
const MAX_ITERATIONS: u32 = 200;
const ESCAPE_MAGNITUDE2: f32 = 1000.0;
const JULIA_C: Complex = Complex {
    r: -0.7269,
    i: 0.1889,
};

#[derive(Clone, Copy)]
struct Complex {
    r: f32,
    i: f32,
}

impl Complex {
    fn magnitude2(self) -> f32 {
        self.r * self.r + self.i * self.i
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        Complex {
            r: self.r * rhs.r - self.i * rhs.i,
            i: self.i * rhs.r + self.r * rhs.i,
        }
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        Complex {
            r: self.r + rhs.r,
            i: self.i + rhs.i,
        }
    }
}

/// Escape-time membership test for the Julia set of JULIA_C. The pixel grid
/// maps onto the square of the complex plane centered on the origin with
/// half-width SCALE.
pub fn julia(x: usize, y: usize, dim: usize) -> bool {
    let half = (dim / 2) as f32;
    let jx = SCALE * (half - x as f32) / half;
    let jy = SCALE * (half - y as f32) / half;

    let mut a = Complex { r: jx, i: jy };
    for _ in 0..MAX_ITERATIONS {
        a = a * a + JULIA_C;
        if a.magnitude2() > ESCAPE_MAGNITUDE2 {
            return false;
        }
    }

    true
}

/// Fills a run of complete bitmap rows, RGBA row-major. Member pixels are
/// red, escaped pixels black.
fn render_rows(rows: &mut [u8], first_row: usize, dim: usize) {
    for (dy, row) in rows.chunks_exact_mut(dim * BYTES_PER_PIXEL).enumerate() {
        let y = first_row + dy;
        for (x, pixel) in row.chunks_exact_mut(BYTES_PER_PIXEL).enumerate() {
            let member = julia(x, y, dim);
            pixel[0] = if member { 255 } else { 0 };
            pixel[1] = 0;
            pixel[2] = 0;
            pixel[3] = 255;
        }
    }
}

pub fn render_serial(dim: usize) -> (Vec<u8>, Duration) {
    let mut bitmap = vec![0u8; dim * dim * BYTES_PER_PIXEL];
    let start = Instant::now();
    render_rows(&mut bitmap, 0, dim);
    (bitmap, start.elapsed())
}

pub struct ParallelRender {
    pub bitmap: Vec<u8>,
    pub elapsed: Duration,
    pub slowest_worker: Duration,
}

/// Renders the bitmap with `thread_count` workers, each taking a contiguous
/// band of rows. The clock starts once every worker is past the barrier so
/// spawn overhead is not measured.
pub fn render_parallel(dim: usize, thread_count: usize) -> ParallelRender {
    let row_bytes = dim * BYTES_PER_PIXEL;
    let rows_per_thread = dim.div_ceil(thread_count);
    let mut bitmap = vec![0u8; dim * row_bytes];

    let worker_times = Mutex::new(Vec::with_capacity(thread_count));
    let mut start = Instant::now();

    {
        // The last band is short when thread_count does not divide dim, and
        // fewer bands than threads exist when rows run out.
        let bands: Vec<(usize, &mut [u8])> = bitmap
            .chunks_mut(rows_per_thread * row_bytes)
            .enumerate()
            .collect();
        let barrier = Barrier::new(bands.len() + 1);

        thread::scope(|s| {
            for (n, band) in bands {
                let barrier = &barrier;
                let worker_times = &worker_times;
                s.spawn(move || {
                    barrier.wait();
                    let begin = Instant::now();
                    render_rows(band, n * rows_per_thread, dim);
                    worker_times.lock().push(begin.elapsed());
                });
            }

            barrier.wait();
            start = Instant::now();
        });
    }

    let elapsed = start.elapsed();
    let slowest_worker = worker_times.lock().iter().max().copied().unwrap_or(elapsed);

    ParallelRender {
        bitmap,
        elapsed,
        slowest_worker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_members(bitmap: &[u8]) -> usize {
        bitmap
            .chunks_exact(BYTES_PER_PIXEL)
            .filter(|pixel| pixel[0] == 255)
            .count()
    }

    #[test]
    fn corner_pixels_escape() {
        assert!(!julia(0, 0, 64));
        assert!(!julia(0, 0, 768));
        assert!(!julia(63, 63, 64));
    }

    #[test]
    fn member_counts_are_stable() {
        // f32 escape-time counts are deterministic for a fixed grid.
        let (bitmap, _) = render_serial(64);
        assert_eq!(count_members(&bitmap), 400);

        let (bitmap, _) = render_serial(50);
        assert_eq!(count_members(&bitmap), 208);
    }

    #[test]
    fn pixels_are_opaque_and_single_channel() {
        let (bitmap, _) = render_serial(16);
        for pixel in bitmap.chunks_exact(BYTES_PER_PIXEL) {
            assert!(pixel[0] == 0 || pixel[0] == 255);
            assert_eq!(pixel[1], 0);
            assert_eq!(pixel[2], 0);
            assert_eq!(pixel[3], 255);
        }
    }

    #[test]
    fn parallel_render_matches_serial() {
        let (reference, _) = render_serial(64);
        for thread_count in [1, 2, 3, 5, 8] {
            let run = render_parallel(64, thread_count);
            assert_eq!(run.bitmap, reference, "threads = {thread_count}");
        }
    }

    #[test]
    fn uneven_row_split_is_covered() {
        // 50 rows over 7 workers leaves a short last band.
        let (reference, _) = render_serial(50);
        let run = render_parallel(50, 7);
        assert_eq!(run.bitmap, reference);
    }

    #[test]
    fn more_threads_than_rows() {
        let (reference, _) = render_serial(4);
        let run = render_parallel(4, 16);
        assert_eq!(run.bitmap, reference);
    }
}
