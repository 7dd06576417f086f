//! Printable report assembly.
//!
//! The report lays out, top to bottom: title and period, summary figures,
//! the trend and per-context chart snapshots, the reading table and a
//! footer. The table breaks onto new pages as the write cursor reaches the
//! bottom margin.

pub mod chart;
pub mod pdf;

use crate::aggregate::{aggregate_by_context, summarize, trend_series};
use crate::config::ReportConfig;
use crate::filter::DateRange;
use crate::{Reading, Result, DEFAULT_UNIT};
use chart::{ChartRenderer, ChartSpec};
use pdf::{Font, PdfDocument, Rgb, PAGE_HEIGHT};
use std::path::Path;

/// Default download name of the exported report
pub const REPORT_FILENAME: &str = "health-diary-report.pdf";
/// MIME type of the exported report
pub const REPORT_MIME: &str = "application/pdf";

const MARGIN_LEFT: f32 = 50.0;
const MARGIN_RIGHT: f32 = 545.0;
const FIRST_PAGE_TOP: f32 = PAGE_HEIGHT - 60.0;
/// Cursor position after a page break
pub const CONTINUATION_TOP: f32 = PAGE_HEIGHT - 50.0;
/// A table row is never started at or below this line
pub const BOTTOM_MARGIN: f32 = 100.0;
const FOOTER_FLOOR: f32 = 40.0;
const ROW_HEIGHT: f32 = 16.0;
const CHART_SCALE: f32 = 0.45;

const HEADING: Rgb = Rgb(0.1, 0.2, 0.4);
const MUTED: Rgb = Rgb(0.3, 0.3, 0.3);

const COLUMNS: [(&str, f32); 4] = [("Date", 50.0), ("Time", 140.0), ("Context", 230.0), ("Level", 380.0)];

/// Text settings for the report
#[derive(Clone, Debug)]
pub struct ReportSettings {
    pub title: String,
    pub footer: String,
    pub filename: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportConfig::default().into()
    }
}

impl From<ReportConfig> for ReportSettings {
    fn from(config: ReportConfig) -> Self {
        Self {
            title: config.title,
            footer: config.footer,
            filename: config.filename,
        }
    }
}

/// A finished report
#[derive(Clone, Debug)]
pub struct Document {
    bytes: Vec<u8>,
    page_count: usize,
    filename: String,
}

impl Document {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &'static str {
        REPORT_MIME
    }

    /// Write the document, creating parent directories as needed
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &self.bytes)?;
        tracing::info!("Wrote {}-page report to {:?}", self.page_count, path);
        Ok(())
    }
}

/// Build the report for `readings`, already filtered and sorted.
///
/// Charts come from `charts` and are requested one after the other, trend
/// first. A chart that is declined or fails is left out. The only errors are
/// document-assembly faults.
pub fn generate_report(
    period: &DateRange,
    readings: &[Reading],
    charts: &dyn ChartRenderer,
    settings: &ReportSettings,
) -> Result<Document> {
    let doc = layout(period, readings, charts, settings)?;
    let bytes = doc.to_bytes()?;
    tracing::info!(
        "Generated report: {} readings on {} pages",
        readings.len(),
        doc.page_count()
    );
    Ok(Document {
        bytes,
        page_count: doc.page_count(),
        filename: settings.filename.clone(),
    })
}

/// Write cursor over a growing document
struct Writer {
    doc: PdfDocument,
    y: f32,
}

impl Writer {
    fn new() -> Self {
        let mut doc = PdfDocument::new();
        doc.add_page();
        Self {
            doc,
            y: FIRST_PAGE_TOP,
        }
    }

    fn new_page(&mut self) {
        self.doc.add_page();
        self.y = CONTINUATION_TOP;
        tracing::debug!("Report page break, now {} pages", self.doc.page_count());
    }

    /// Break the page unless `needed` units fit above `floor`
    fn ensure_room(&mut self, needed: f32, floor: f32) {
        if self.y - needed < floor {
            self.new_page();
        }
    }

    fn text(&mut self, text: &str, x: f32, size: f32, font: Font, color: Rgb) -> Result<()> {
        self.doc.draw_text(text, x, self.y, size, font, color)
    }

    fn rule(&mut self, thickness: f32, color: Rgb) -> Result<()> {
        self.doc
            .draw_line((MARGIN_LEFT, self.y), (MARGIN_RIGHT, self.y), thickness, color)
    }
}

fn layout(
    period: &DateRange,
    readings: &[Reading],
    charts: &dyn ChartRenderer,
    settings: &ReportSettings,
) -> Result<PdfDocument> {
    let mut w = Writer::new();

    // Header
    w.text(&settings.title, MARGIN_LEFT, 24.0, Font::Bold, HEADING)?;
    w.y -= 30.0;
    w.rule(1.0, HEADING)?;
    w.y -= 40.0;
    w.text(
        &format!(
            "Report Period: {} to {}",
            period.start.format("%Y-%m-%d"),
            period.end.format("%Y-%m-%d")
        ),
        MARGIN_LEFT,
        12.0,
        Font::Regular,
        Rgb::BLACK,
    )?;
    w.y -= 30.0;

    // Summary
    let unit = readings.first().map_or(DEFAULT_UNIT, Reading::unit);
    match summarize(readings) {
        Some(summary) => {
            w.text(
                &format!("Average Level: {} {}", summary.average, unit),
                MARGIN_LEFT,
                12.0,
                Font::Bold,
                Rgb::BLACK,
            )?;
            w.y -= 20.0;
            w.text(
                &format!("Highest Level: {} {}", summary.max, unit),
                MARGIN_LEFT,
                12.0,
                Font::Regular,
                Rgb::BLACK,
            )?;
            w.y -= 20.0;
            w.text(
                &format!("Lowest Level: {} {}", summary.min, unit),
                MARGIN_LEFT,
                12.0,
                Font::Regular,
                Rgb::BLACK,
            )?;
            w.y -= 40.0;
        }
        None => {
            w.text(
                "No readings recorded for this period.",
                MARGIN_LEFT,
                12.0,
                Font::Regular,
                MUTED,
            )?;
            w.y -= 40.0;
        }
    }

    if !readings.is_empty() {
        let specs = [
            ChartSpec::Trend(trend_series(readings)),
            ChartSpec::ContextAverages(aggregate_by_context(readings)),
        ];
        for spec in &specs {
            place_chart(&mut w, charts, spec)?;
        }
        write_table(&mut w, readings)?;
    }

    // Footer
    w.y -= 30.0;
    w.ensure_room(20.0, FOOTER_FLOOR);
    w.rule(1.0, HEADING)?;
    w.y -= 20.0;
    w.text(&settings.footer, MARGIN_LEFT, 10.0, Font::Regular, MUTED)?;

    Ok(w.doc)
}

fn place_chart(w: &mut Writer, charts: &dyn ChartRenderer, spec: &ChartSpec) -> Result<()> {
    let encoded = match charts.render_chart(spec) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => {
            tracing::debug!("No {} chart supplied, omitting", spec.name());
            return Ok(());
        }
        Err(e) => {
            tracing::warn!("Capturing {} chart failed: {}. Omitting it.", spec.name(), e);
            return Ok(());
        }
    };

    let image = match w.doc.embed_image(&encoded) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Embedding {} chart failed: {}. Omitting it.", spec.name(), e);
            return Ok(());
        }
    };

    let source = w.doc.image(image);
    let mut width = source.width as f32 * CHART_SCALE;
    let mut height = source.height as f32 * CHART_SCALE;
    let max_width = MARGIN_RIGHT - MARGIN_LEFT;
    if width > max_width {
        height *= max_width / width;
        width = max_width;
    }
    // Must fit on an empty continuation page
    let max_height = CONTINUATION_TOP - BOTTOM_MARGIN;
    if height > max_height {
        width *= max_height / height;
        height = max_height;
    }

    w.ensure_room(height, BOTTOM_MARGIN);
    w.doc.draw_image(image, MARGIN_LEFT, w.y - height, width, height)?;
    w.y -= height + 40.0;
    Ok(())
}

fn write_table(w: &mut Writer, readings: &[Reading]) -> Result<()> {
    // Heading, column titles and the first row stay together
    w.ensure_room(52.0 + ROW_HEIGHT, BOTTOM_MARGIN);

    w.text("Blood Sugar Readings", MARGIN_LEFT, 14.0, Font::Bold, HEADING)?;
    w.y -= 20.0;
    for (title, x) in COLUMNS {
        w.text(title, x, 10.0, Font::Bold, Rgb::BLACK)?;
    }
    w.y -= 12.0;
    w.rule(0.5, Rgb::BLACK)?;
    w.y -= 20.0;

    for reading in readings {
        if w.y <= BOTTOM_MARGIN {
            w.new_page();
        }
        let cells = [
            reading.date_string(),
            reading.time_string(),
            reading.context().to_string(),
            format!("{} {}", reading.level_string(), reading.unit()),
        ];
        for ((_, x), cell) in COLUMNS.iter().zip(&cells) {
            w.text(cell, *x, 10.0, Font::Regular, Rgb::BLACK)?;
        }
        w.y -= ROW_HEIGHT;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::chart::{NoCharts, RasterChartRenderer};
    use super::pdf::DrawOp;
    use super::*;
    use crate::types::fixtures::reading;
    use crate::Error;
    use chrono::NaiveDate;

    fn period() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        )
    }

    fn texts(doc: &PdfDocument) -> Vec<String> {
        doc.pages()
            .iter()
            .flatten()
            .filter_map(|op| match op {
                DrawOp::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn image_count(doc: &PdfDocument) -> usize {
        doc.pages()
            .iter()
            .flatten()
            .filter(|op| matches!(op, DrawOp::Image { .. }))
            .count()
    }

    #[test]
    fn test_single_reading_report() {
        crate::logging::init_test();
        let readings = vec![reading("2024-03-01", "07:00", "Fasting", 95.0)];
        let doc = layout(&period(), &readings, &NoCharts, &ReportSettings::default()).unwrap();

        let texts = texts(&doc);
        assert_eq!(texts[0], "Health Diary Report");
        assert!(texts.contains(&"Report Period: 2024-03-01 to 2024-03-31".to_string()));
        assert!(texts.contains(&"Average Level: 95 mg/dL".to_string()));
        assert!(texts.contains(&"Highest Level: 95 mg/dL".to_string()));
        assert!(texts.contains(&"Lowest Level: 95 mg/dL".to_string()));
        assert_eq!(texts.iter().filter(|t| *t == "95 mg/dL").count(), 1);
        assert_eq!(texts.last().unwrap(), &ReportSettings::default().footer);
        assert_eq!(image_count(&doc), 0);
    }

    #[test]
    fn test_empty_report_has_header_and_footer_only() {
        let doc = layout(&period(), &[], &RasterChartRenderer::default(), &ReportSettings::default())
            .unwrap();
        let texts = texts(&doc);

        assert_eq!(doc.page_count(), 1);
        assert!(!texts.iter().any(|t| t.starts_with("Average Level")));
        assert!(!texts.iter().any(|t| t == "Blood Sugar Readings"));
        assert!(texts.contains(&"No readings recorded for this period.".to_string()));
        assert_eq!(image_count(&doc), 0);

        let document =
            generate_report(&period(), &[], &NoCharts, &ReportSettings::default()).unwrap();
        assert!(document.bytes().starts_with(b"%PDF-"));
    }

    #[test]
    fn test_charts_are_embedded_in_order() {
        let readings = vec![
            reading("2024-03-01", "07:00", "Fasting", 95.0),
            reading("2024-03-02", "13:00", "Random", 150.0),
        ];
        let renderer = RasterChartRenderer { width: 400, height: 200 };
        let doc = layout(&period(), &readings, &renderer, &ReportSettings::default()).unwrap();
        assert_eq!(image_count(&doc), 2);
    }

    #[test]
    fn test_failed_chart_is_omitted() {
        let readings = vec![reading("2024-03-01", "07:00", "Fasting", 95.0)];
        let renderer = |spec: &ChartSpec| -> Result<Option<Vec<u8>>> {
            match spec {
                ChartSpec::Trend(_) => Err(Error::Other("surface busy".into())),
                ChartSpec::ContextAverages(_) => {
                    RasterChartRenderer { width: 200, height: 100 }.render_chart(spec)
                }
            }
        };
        let doc = layout(&period(), &readings, &renderer, &ReportSettings::default()).unwrap();
        assert_eq!(image_count(&doc), 1);

        let garbage = |_: &ChartSpec| -> Result<Option<Vec<u8>>> { Ok(Some(b"junk".to_vec())) };
        let doc = layout(&period(), &readings, &garbage, &ReportSettings::default()).unwrap();
        assert_eq!(image_count(&doc), 0);
        assert!(texts(&doc).contains(&"95 mg/dL".to_string()));
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        let canvas = image::RgbImage::from_pixel(width, height, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        canvas
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_tall_chart_stays_on_page() {
        let readings = vec![reading("2024-03-01", "07:00", "Fasting", 95.0)];
        let tall = png(200, 3000);
        let renderer = |_: &ChartSpec| -> Result<Option<Vec<u8>>> { Ok(Some(tall.clone())) };
        let doc = layout(&period(), &readings, &renderer, &ReportSettings::default()).unwrap();

        let images: Vec<(f32, f32, f32)> = doc
            .pages()
            .iter()
            .flatten()
            .filter_map(|op| match op {
                DrawOp::Image { y, width, height, .. } => Some((*y, *width, *height)),
                _ => None,
            })
            .collect();
        assert_eq!(images.len(), 2);
        for (y, width, height) in images {
            assert!(y >= BOTTOM_MARGIN, "image bottom at y={} is below the margin", y);
            assert!(y + height <= PAGE_HEIGHT);
            assert!(height <= CONTINUATION_TOP - BOTTOM_MARGIN);
            // Aspect ratio is kept
            assert!((height / width - 15.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_table_paginates_without_losing_rows() {
        let readings: Vec<Reading> = (0..200)
            .map(|i| reading("2024-03-01", "07:00", "Bedtime", 60.0 + i as f64))
            .collect();
        let doc = layout(&period(), &readings, &NoCharts, &ReportSettings::default()).unwrap();

        assert!(doc.page_count() >= 4);
        let texts = texts(&doc);
        for i in 0..200 {
            let cell = format!("{} mg/dL", 60 + i);
            assert_eq!(texts.iter().filter(|t| **t == cell).count(), 1, "row {}", cell);
        }

        for page in doc.pages() {
            for op in page {
                if let DrawOp::Text { y, .. } = op {
                    assert!(*y >= FOOTER_FLOOR - 20.0 && *y <= PAGE_HEIGHT);
                }
            }
        }
        // Continuation pages start rows at the reset cursor
        let second_page_top = doc.pages()[1]
            .iter()
            .find_map(|op| match op {
                DrawOp::Text { y, .. } => Some(*y),
                _ => None,
            })
            .unwrap();
        assert_eq!(second_page_top, CONTINUATION_TOP);
    }

    #[test]
    fn test_document_metadata() {
        let readings = vec![reading("2024-03-01", "07:00", "Fasting", 95.0)];
        let document =
            generate_report(&period(), &readings, &NoCharts, &ReportSettings::default()).unwrap();
        assert_eq!(document.filename(), "health-diary-report.pdf");
        assert_eq!(document.mime_type(), "application/pdf");
        assert_eq!(document.page_count(), 1);

        let settings = ReportSettings {
            filename: "march.pdf".into(),
            ..ReportSettings::default()
        };
        let renamed = generate_report(&period(), &readings, &NoCharts, &settings).unwrap();
        assert_eq!(renamed.filename(), "march.pdf");

        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reports").join(document.filename());
        document.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), document.into_bytes());
    }
}
