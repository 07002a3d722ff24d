use std::error::Error;
use std::path::{Path, PathBuf};

use plotters::backend::DrawingBackend;
use plotters::prelude::SVGBackend;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use structopt::StructOpt;
use thousands::Separable;

mod perf;
mod perf_info;
mod perf_julia;
mod perf_measured;

use crate::perf::{write_csv, Measurement, SpeedupSeries};

// Enable this to use mimalloc
//#[global_allocator]
//static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "fractal-bench",
    about = "Julia set render benchmark with speedup charts"
)]
struct Opt {
    /// Width and height of the rendered bitmap in pixels
    #[structopt(long, default_value = "768")]
    dim: usize,

    /// Highest thread count to benchmark, defaults to the logical processor count
    #[structopt(long)]
    max_threads: Option<usize>,

    /// Directory the SVG, PNG and CSV artifacts are written to
    #[structopt(long, default_value = ".", parse(from_os_str))]
    out_dir: PathBuf,

    /// Skip the benchmark and chart only the stored measurements
    #[structopt(long)]
    plot_only: bool,

    /// Also write the rendered fractal as julia.png
    #[structopt(long)]
    save_bitmap: bool,
}

fn main() {
    let opt = Opt::from_args();
    assert!(opt.dim >= 2, "--dim must be at least 2");

    perf_info::write_cpu_info();

    write_plot(
        perf_measured::MEASURED.measurements(),
        "Speedup vs. Number of Threads",
        &opt.out_dir.join("speedup-measured.svg"),
    )
    .expect("failed to plot");

    if !opt.plot_only {
        run_julia_scaling_test(&opt);
    }
}

fn run_julia_scaling_test(opt: &Opt) {
    let dim = opt.dim;
    let max_threads = opt
        .max_threads
        .unwrap_or_else(perf_info::get_num_cpus)
        .max(1);

    print!(
        "Julia serial   ({} pixels) ... ",
        (dim * dim).separate_with_commas()
    );
    let (bitmap, serial_elapsed) = perf_julia::render_serial(dim);
    println!("{} ms", serial_elapsed.as_millis());

    let serial_ns = serial_elapsed.as_nanos().max(1) as f64;
    let mut threads = Vec::with_capacity(max_threads);
    let mut speedups = Vec::with_capacity(max_threads);

    for thread_count in 1..=max_threads {
        print!("Julia parallel (threads {thread_count:>3}) ... ");
        let run = perf_julia::render_parallel(dim, thread_count);
        let speedup = serial_ns / run.elapsed.as_nanos().max(1) as f64;
        println!(
            "{:>5} ms  (slowest worker {} ms)  speedup {:.4}",
            run.elapsed.as_millis(),
            run.slowest_worker.as_millis(),
            speedup
        );

        threads.push(thread_count as u64);
        speedups.push(speedup);
    }

    let series = SpeedupSeries::from_points("julia", &threads, &speedups)
        .expect("benchmark produced a malformed series");

    write_csv(series.measurements(), &opt.out_dir.join("speedup.csv"))
        .expect("failed to write csv");

    write_plot(
        series.measurements(),
        "Speedup vs. Number of Threads",
        &opt.out_dir.join("speedup.svg"),
    )
    .expect("failed to plot");

    if opt.save_bitmap {
        write_bitmap(&bitmap, dim, &opt.out_dir.join("julia.png")).expect("failed to write bitmap");
    }
}

const FONT: &str = "sans-serif";
const PLOT_WIDTH: u32 = 800;
const PLOT_HEIGHT: u32 = 400;

pub fn write_plot(
    records: &[Measurement],
    caption: &str,
    path: &Path,
) -> Result<(), Box<dyn Error>> {
    let root = SVGBackend::new(path, (PLOT_WIDTH, PLOT_HEIGHT)).into_drawing_area();

    root.fill(&WHITE)?;

    let x_max = records.iter().map(|m| m.thread_count).max().unwrap_or(1);
    let y_max = records.iter().map(|m| m.speedup).fold(0.0f64, f64::max);
    let y_padding = (y_max / 10.0).max(0.5);

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .caption(caption, (FONT, 20))
        .set_label_area_size(LabelAreaPosition::Left, 70)
        .set_label_area_size(LabelAreaPosition::Right, 70)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(0..x_max + 1, 0.0..y_max + y_padding)?;

    chart
        .configure_mesh()
        .x_label_formatter(&|v| format!("{}", v))
        .y_label_formatter(&|v| format!("{:.1}", v))
        .x_labels(20)
        .y_desc("Speedup")
        .x_desc("Number of Threads")
        .draw()?;

    chart.draw_series(LineSeries::new(
        records
            .iter()
            .map(|record| (record.thread_count, record.speedup)),
        &BLUE,
    ))?;

    chart.draw_series(
        records
            .iter()
            .map(|record| Circle::new((record.thread_count, record.speedup), 3, BLUE.filled())),
    )?;

    // Each point carries its coordinates, right edge and bottom of the text
    // anchored on the point.
    let label_style =
        TextStyle::from((FONT, 12).into_font()).pos(Pos::new(HPos::Right, VPos::Bottom));
    chart.draw_series(records.iter().map(|record| {
        Text::new(
            format!("({},{:.4})", record.thread_count, record.speedup),
            (record.thread_count, record.speedup),
            label_style.clone(),
        )
    }))?;

    root.present()?;
    Ok(())
}

fn write_bitmap(bitmap: &[u8], dim: usize, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut backend = BitMapBackend::new(path, (dim as u32, dim as u32));

    for y in 0..dim {
        for x in 0..dim {
            let offset = (x + y * dim) * perf_julia::BYTES_PER_PIXEL;
            let color = RGBColor(bitmap[offset], bitmap[offset + 1], bitmap[offset + 2]);
            backend.draw_pixel((x as i32, y as i32), color.to_backend_color())?;
        }
    }

    backend.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_has_title_labels_and_point_annotations() {
        let path = std::env::temp_dir().join(format!("speedup-chart-{}.svg", std::process::id()));

        write_plot(
            perf_measured::MEASURED.measurements(),
            "Speedup vs. Number of Threads",
            &path,
        )
        .unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Speedup vs. Number of Threads"));
        assert!(svg.contains("Number of Threads"));
        assert!(svg.contains("(1,1.0807)"));
        assert!(svg.contains("(16,4.1749)"));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn fractal_png_is_written() {
        let (bitmap, _) = perf_julia::render_serial(16);
        let path = std::env::temp_dir().join(format!("julia-{}.png", std::process::id()));

        write_bitmap(&bitmap, 16, &path).unwrap();

        assert!(std::fs::metadata(&path).unwrap().len() > 0);
        std::fs::remove_file(&path).unwrap();
    }
}
