use plotters::element::Pie;
use plotters::prelude::*;
use plotters::style::Palette;
use std::path::Path;
use thiserror::Error;

use crate::error::AppError;
use crate::models::{ChartData, ChartKind, ChartSpec, HistogramBin};

const PIE_SIZE: (u32, u32) = (600, 600);
const CHART_SIZE: (u32, u32) = (600, 400);
const FONT: &str = "sans-serif";

#[derive(Debug, Error)]
#[error("{0}")]
pub struct RenderError(String);

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Rendering(err.0)
    }
}

fn draw_error<E: std::fmt::Display>(err: E) -> RenderError {
    RenderError(err.to_string())
}

/// Turns a chart descriptor into an image file.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, chart: &ChartSpec, path: &Path) -> Result<(), RenderError>;
}

/// Draws PNG charts with plotters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlottersRenderer;

impl ChartRenderer for PlottersRenderer {
    fn render(&self, chart: &ChartSpec, path: &Path) -> Result<(), RenderError> {
        match (&chart.kind, &chart.data) {
            (ChartKind::Pie, ChartData::Categories(categories)) => draw_pie(chart, categories, path),
            (ChartKind::Bar, ChartData::Categories(categories)) => draw_bar(chart, categories, path),
            (ChartKind::Histogram, ChartData::Bins(bins)) => draw_histogram(chart, bins, path),
            (kind, _) => Err(RenderError::new(format!(
                "{:?} chart for {} has mismatched data",
                kind, chart.column
            ))),
        }
    }
}

fn palette_color(idx: usize) -> RGBColor {
    let (r, g, b) = Palette99::COLORS[idx % Palette99::COLORS.len()];
    RGBColor(r, g, b)
}

fn draw_pie(chart: &ChartSpec, categories: &[(String, usize)], path: &Path) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, PIE_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;
    let area = root.titled(&chart.title, (FONT, 24)).map_err(draw_error)?;

    let (width, height) = area.dim_in_pixel();
    let center = (width as i32 / 2, height as i32 / 2);
    let radius = f64::from(width.min(height)) * 0.35;

    let sizes: Vec<f64> = categories.iter().map(|(_, count)| *count as f64).collect();
    let labels: Vec<&str> = categories.iter().map(|(label, _)| label.as_str()).collect();
    let colors: Vec<RGBColor> = (0..categories.len()).map(palette_color).collect();

    let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
    pie.start_angle(90.0);
    pie.label_style((FONT, 16).into_font().color(&BLACK));
    pie.percentages((FONT, 14).into_font().color(&WHITE));
    area.draw(&pie).map_err(draw_error)?;

    root.present().map_err(draw_error)
}

fn draw_bar(chart: &ChartSpec, categories: &[(String, usize)], path: &Path) -> Result<(), RenderError> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let max_count = categories.iter().map(|(_, count)| *count).max().unwrap_or(0) as u32;
    let labels: Vec<&str> = categories.iter().map(|(label, _)| label.as_str()).collect();
    let label_formatter = |value: &SegmentValue<u32>| match value {
        SegmentValue::CenterOf(idx) => labels.get(*idx as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    };

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, (FONT, 20))
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(
            (0u32..categories.len() as u32).into_segmented(),
            0u32..max_count + 1,
        )
        .map_err(draw_error)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.column.as_str())
        .y_desc("Count")
        .x_labels(categories.len())
        .x_label_formatter(&label_formatter)
        .draw()
        .map_err(draw_error)?;

    ctx.draw_series(
        Histogram::vertical(&ctx)
            .style(palette_color(0).filled())
            .margin(4)
            .data(
                categories
                    .iter()
                    .enumerate()
                    .map(|(idx, (_, count))| (idx as u32, *count as u32)),
            ),
    )
    .map_err(draw_error)?;

    root.present().map_err(draw_error)
}

fn draw_histogram(chart: &ChartSpec, bins: &[HistogramBin], path: &Path) -> Result<(), RenderError> {
    let (first, last) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(RenderError::new(format!("No bins to draw for {}", chart.column))),
    };

    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let max_count = bins.iter().map(|b| b.count).max().unwrap_or(0) as u32;

    let mut ctx = ChartBuilder::on(&root)
        .caption(&chart.title, (FONT, 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(first.start..last.end, 0u32..max_count + 1)
        .map_err(draw_error)?;

    ctx.configure_mesh()
        .disable_x_mesh()
        .x_desc(chart.column.as_str())
        .y_desc("Frequency")
        .draw()
        .map_err(draw_error)?;

    ctx.draw_series(bins.iter().map(|bin| {
        Rectangle::new(
            [(bin.start, 0u32), (bin.end, bin.count as u32)],
            palette_color(0).filled(),
        )
    }))
    .map_err(draw_error)?;

    root.present().map_err(draw_error)
}
