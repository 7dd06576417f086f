//! Chart snapshots for the report.
//!
//! Rasterization is a capability injected by the caller through
//! [`ChartRenderer`]. A renderer may decline (`Ok(None)`) or fail (`Err`);
//! either way the report carries on without that chart.

use crate::aggregate::ContextAverages;
use crate::{Error, Result};
use chrono::NaiveDateTime;
use image::{ImageFormat, RgbImage};
use plotters::prelude::*;
use std::io::Cursor;

/// What to draw
#[derive(Clone, Debug, PartialEq)]
pub enum ChartSpec {
    /// Level over time
    Trend(Vec<(NaiveDateTime, f64)>),
    /// Average level per context
    ContextAverages(ContextAverages),
}

impl ChartSpec {
    pub fn name(&self) -> &'static str {
        match self {
            ChartSpec::Trend(_) => "trend",
            ChartSpec::ContextAverages(_) => "context averages",
        }
    }
}

/// Turns a chart spec into encoded image bytes (PNG)
pub trait ChartRenderer {
    fn render_chart(&self, spec: &ChartSpec) -> Result<Option<Vec<u8>>>;
}

impl<F> ChartRenderer for F
where
    F: Fn(&ChartSpec) -> Result<Option<Vec<u8>>>,
{
    fn render_chart(&self, spec: &ChartSpec) -> Result<Option<Vec<u8>>> {
        self(spec)
    }
}

/// Renderer that never produces a chart
#[derive(Clone, Copy, Debug, Default)]
pub struct NoCharts;

impl ChartRenderer for NoCharts {
    fn render_chart(&self, _spec: &ChartSpec) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

const LINE: RGBColor = RGBColor(248, 123, 27);
const BAR: RGBColor = RGBColor(17, 34, 78);
const GRID: RGBColor = RGBColor(221, 221, 221);

/// Built-in renderer drawing line and bar charts with `plotters`
#[derive(Clone, Copy, Debug)]
pub struct RasterChartRenderer {
    pub width: u32,
    pub height: u32,
}

impl Default for RasterChartRenderer {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 400,
        }
    }
}

impl ChartRenderer for RasterChartRenderer {
    fn render_chart(&self, spec: &ChartSpec) -> Result<Option<Vec<u8>>> {
        let (width, height) = (self.width.max(64), self.height.max(64));
        let mut buffer = vec![0u8; width as usize * height as usize * 3];

        match spec {
            ChartSpec::Trend(points) if points.is_empty() => return Ok(None),
            ChartSpec::ContextAverages(groups) if groups.is_empty() => return Ok(None),
            ChartSpec::Trend(points) => draw_trend(&mut buffer, (width, height), points)?,
            ChartSpec::ContextAverages(groups) => draw_bars(&mut buffer, (width, height), groups)?,
        }

        let canvas = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| Error::Report(format!("{} chart buffer has the wrong size", spec.name())))?;
        let mut bytes = Vec::new();
        canvas.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        tracing::debug!("Rendered {} chart ({} bytes)", spec.name(), bytes.len());
        Ok(Some(bytes))
    }
}

fn plot_error<E: std::fmt::Display>(e: E) -> Error {
    Error::Report(format!("plotting error: {}", e))
}

/// Level against days since the first reading
fn draw_trend(
    buffer: &mut [u8],
    size: (u32, u32),
    points: &[(NaiveDateTime, f64)],
) -> Result<()> {
    let mut ordered = points.to_vec();
    ordered.sort_by_key(|(at, _)| *at);
    let first = ordered[0].0;
    let series: Vec<(f64, f64)> = ordered
        .iter()
        .map(|(at, level)| ((*at - first).num_minutes() as f64 / 1440.0, *level))
        .collect();

    let x_max = series.iter().map(|(x, _)| *x).fold(1.0, f64::max);
    let y_max = series.iter().map(|(_, y)| *y).fold(1.0, f64::max) * 1.1;

    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..x_max, 0.0..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .light_line_style(GRID)
        .x_desc("Days")
        .y_desc("Level")
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(LineSeries::new(series.iter().copied(), LINE.stroke_width(2)))
        .map_err(plot_error)?;
    chart
        .draw_series(series.iter().map(|&point| Circle::new(point, 3, LINE.filled())))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}

/// One bar per context, in group order
fn draw_bars(buffer: &mut [u8], size: (u32, u32), groups: &ContextAverages) -> Result<()> {
    let slots = groups.len() as f64;
    let y_max = groups.iter().map(|g| g.average as f64).fold(1.0, f64::max) * 1.1;
    let names: Vec<String> = groups.iter().map(|g| g.context.to_string()).collect();

    let root = BitMapBackend::with_buffer(buffer, size).into_drawing_area();
    root.fill(&WHITE).map_err(plot_error)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(0.0..slots, 0.0..y_max)
        .map_err(plot_error)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(GRID)
        .x_labels(groups.len())
        .x_label_formatter(&|v| {
            names
                .get(v.floor() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_desc("Average level")
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()
        .map_err(plot_error)?;

    chart
        .draw_series(groups.iter().enumerate().map(|(i, group)| {
            let x = i as f64;
            Rectangle::new(
                [(x + 0.2, 0.0), (x + 0.8, group.average.max(0) as f64)],
                BAR.filled(),
            )
        }))
        .map_err(plot_error)?;

    root.present().map_err(plot_error)?;
    Ok(())
}
