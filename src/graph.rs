use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::f64::consts::PI;
use std::ops::Range;

use crate::config::{OutputFormat, RenderOptions};

/// Values along one axis; text columns are drawn at category indices
#[derive(Debug, Clone, PartialEq)]
pub struct AxisData {
    pub values: Vec<f64>,
    pub categories: Option<Vec<String>>,
}

/// Aggregated data ready to draw
#[derive(Debug, Clone, PartialEq)]
pub enum Figure {
    Bar {
        categories: Vec<String>,
        values: Vec<f64>,
        /// One palette color per category instead of a single fill
        hue: bool,
    },
    Pie {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    Scatter {
        x: AxisData,
        y: AxisData,
    },
    Line {
        categories: Vec<String>,
        values: Vec<f64>,
    },
}

impl Figure {
    pub fn is_empty(&self) -> bool {
        match self {
            Figure::Bar { values, .. } | Figure::Pie { values, .. } | Figure::Line { values, .. } => {
                values.is_empty()
            }
            Figure::Scatter { x, .. } => x.values.is_empty(),
        }
    }
}

/// Drawing surface for a single chart
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    format: OutputFormat,
    title: Option<String>,
    x_desc: Option<String>,
    y_desc: Option<String>,
}

impl Canvas {
    pub fn new(options: &RenderOptions, title: Option<String>) -> Self {
        Canvas {
            width: options.width,
            height: options.height,
            format: options.format,
            title,
            x_desc: None,
            y_desc: None,
        }
    }

    pub fn with_axis_labels(mut self, x_desc: Option<String>, y_desc: Option<String>) -> Self {
        self.x_desc = x_desc;
        self.y_desc = y_desc;
        self
    }

    /// Draw the figure and encode it in the configured format
    pub fn render(&self, figure: &Figure) -> Result<Vec<u8>> {
        if figure.is_empty() {
            anyhow::bail!("Cannot create chart with no data points");
        }
        self.encode(|root| self.draw(root, figure), |root| self.draw(root, figure))
    }

    /// Titled, labelled axes with nothing plotted, for an empty row subset
    pub fn render_empty(&self) -> Result<Vec<u8>> {
        self.encode(|root| self.draw_empty(root), |root| self.draw_empty(root))
    }

    fn encode<P, S>(&self, draw_png: P, draw_svg: S) -> Result<Vec<u8>>
    where
        P: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> Result<()>,
        S: FnOnce(&DrawingArea<SVGBackend<'_>, Shift>) -> Result<()>,
    {
        match self.format {
            OutputFormat::Png => {
                let mut buffer = vec![0u8; pixel_buffer_len(self.width, self.height)?];
                {
                    let root = BitMapBackend::with_buffer(&mut buffer, (self.width, self.height))
                        .into_drawing_area();
                    draw_png(&root)?;
                    root.present()
                        .map_err(|e| anyhow!("Failed to present drawing: {e}"))?;
                }
                encode_png(&buffer, self.width, self.height)
            }
            OutputFormat::Svg => {
                let mut svg = String::new();
                {
                    let root = SVGBackend::with_string(&mut svg, (self.width, self.height))
                        .into_drawing_area();
                    draw_svg(&root)?;
                    root.present()
                        .map_err(|e| anyhow!("Failed to present drawing: {e}"))?;
                }
                Ok(svg.into_bytes())
            }
        }
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Failed to fill background: {e}"))?;

        match figure {
            Figure::Bar {
                categories,
                values,
                hue,
            } => self.draw_bars(root, categories, values, *hue),
            Figure::Pie { labels, values } => self.draw_pie(root, labels, values),
            Figure::Scatter { x, y } => self.draw_points(root, x, y),
            Figure::Line { categories, values } => self.draw_line(root, categories, values),
        }
    }

    fn draw_empty<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()> {
        root.fill(&WHITE)
            .map_err(|e| anyhow!("Failed to fill background: {e}"))?;

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0..1.0, 0.0..1.0)
            .map_err(|e| anyhow!("Failed to build chart: {e}"))?;

        chart
            .configure_mesh()
            .x_desc(self.x_desc.clone().unwrap_or_default())
            .y_desc(self.y_desc.clone().unwrap_or_default())
            .draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {e}"))?;

        Ok(())
    }

    fn draw_bars<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        categories: &[String],
        values: &[f64],
        hue: bool,
    ) -> Result<()> {
        if categories.len() != values.len() {
            anyhow::bail!(
                "Categories and Y data must have the same length (categories: {}, y: {})",
                categories.len(),
                values.len()
            );
        }

        let n = categories.len();
        // Bars grow from zero, so zero is always in range
        let y_range = padded_range(values.iter().copied().chain(std::iter::once(0.0)));

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(category_range(n), y_range)
            .map_err(|e| anyhow!("Failed to build chart: {e}"))?;

        let categories_owned = Some(categories.to_vec());
        chart
            .configure_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| tick_label(&categories_owned, *x))
            .x_desc(self.x_desc.clone().unwrap_or_default())
            .y_desc(self.y_desc.clone().unwrap_or_default())
            .draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {e}"))?;

        let bar_width = 0.8;
        for (idx, &value) in values.iter().enumerate() {
            let color = if hue {
                Palette99::pick(idx).to_rgba()
            } else {
                BLUE.mix(0.8)
            };
            let x_center = idx as f64;
            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [
                        (x_center - bar_width / 2.0, 0.0),
                        (x_center + bar_width / 2.0, value),
                    ],
                    color.filled(),
                )))
                .map_err(|e| anyhow!("Failed to draw bar: {e}"))?;
        }

        let label_style = TextStyle::from(("sans-serif", 12)).pos(Pos::new(HPos::Center, VPos::Bottom));
        chart
            .draw_series(
                values
                    .iter()
                    .enumerate()
                    .map(|(idx, &value)| Text::new(bar_label(value), (idx as f64, value), label_style.clone())),
            )
            .map_err(|e| anyhow!("Failed to draw bar labels: {e}"))?;

        Ok(())
    }

    fn draw_pie<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        labels: &[String],
        values: &[f64],
    ) -> Result<()> {
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            anyhow::bail!("Cannot create pie chart from non-positive values");
        }

        let area = root
            .titled(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .map_err(|e| anyhow!("Failed to draw title: {e}"))?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let radius = w.min(h) as f64 * 0.35;

        // Counter-clockwise from twelve o'clock
        let mut start = PI / 2.0;
        for (idx, (label, &value)) in labels.iter().zip(values).enumerate() {
            let sweep = value / total * 2.0 * PI;
            let steps = ((sweep.to_degrees().ceil() as usize).max(1)).min(360);

            let mut points = Vec::with_capacity(steps + 2);
            points.push(to_pixel(center, 0.0, start));
            for step in 0..=steps {
                let angle = start + sweep * step as f64 / steps as f64;
                points.push(to_pixel(center, radius, angle));
            }

            area.draw(&Polygon::new(points, Palette99::pick(idx).filled()))
                .map_err(|e| anyhow!("Failed to draw pie slice: {e}"))?;

            let mid = start + sweep / 2.0;
            let text = format!("{} ({:.1}%)", label, value / total * 100.0);
            area.draw(&Text::new(text, to_pixel(center, radius * 1.15, mid), ("sans-serif", 14)))
                .map_err(|e| anyhow!("Failed to draw pie label: {e}"))?;

            start += sweep;
        }

        Ok(())
    }

    fn draw_points<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        x: &AxisData,
        y: &AxisData,
    ) -> Result<()> {
        if x.values.len() != y.values.len() {
            anyhow::bail!(
                "X and Y data must have the same length (x: {}, y: {})",
                x.values.len(),
                y.values.len()
            );
        }

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(80)
            .build_cartesian_2d(axis_range(x), axis_range(y))
            .map_err(|e| anyhow!("Failed to build chart: {e}"))?;

        chart
            .configure_mesh()
            .x_labels(label_count(x))
            .y_labels(label_count(y))
            .x_label_formatter(&|v| tick_label(&x.categories, *v))
            .y_label_formatter(&|v| tick_label(&y.categories, *v))
            .x_desc(self.x_desc.clone().unwrap_or_default())
            .y_desc(self.y_desc.clone().unwrap_or_default())
            .draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {e}"))?;

        chart
            .draw_series(
                x.values
                    .iter()
                    .zip(&y.values)
                    .map(|(&px, &py)| Circle::new((px, py), 5, BLUE.mix(0.7).filled())),
            )
            .map_err(|e| anyhow!("Failed to draw point series: {e}"))?;

        Ok(())
    }

    fn draw_line<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        categories: &[String],
        values: &[f64],
    ) -> Result<()> {
        let n = categories.len();
        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .caption(self.title.as_deref().unwrap_or(""), ("sans-serif", 20))
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(category_range(n), padded_range(values.iter().copied()))
            .map_err(|e| anyhow!("Failed to build chart: {e}"))?;

        let categories_owned = Some(categories.to_vec());
        chart
            .configure_mesh()
            .x_labels(n)
            .x_label_formatter(&|x| tick_label(&categories_owned, *x))
            .x_desc(self.x_desc.clone().unwrap_or_default())
            .y_desc(self.y_desc.clone().unwrap_or_default())
            .draw()
            .map_err(|e| anyhow!("Failed to draw mesh: {e}"))?;

        let points: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(idx, &v)| (idx as f64, v))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), MAGENTA.stroke_width(2)))
            .map_err(|e| anyhow!("Failed to draw line series: {e}"))?;
        chart
            .draw_series(points.into_iter().map(|p| Circle::new(p, 4, MAGENTA.filled())))
            .map_err(|e| anyhow!("Failed to draw line markers: {e}"))?;

        Ok(())
    }
}

/// Bar height annotation, truncated to an integer
fn bar_label(value: f64) -> String {
    format!("{}", value.trunc() as i64)
}

/// RGB buffer size, refusing dimensions whose byte count overflows
fn pixel_buffer_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(3))
        .ok_or_else(|| anyhow!("Image size {}x{} is too large", width, height))
}

fn encode_png(buffer: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    Ok(png_bytes)
}

fn to_pixel(center: (f64, f64), radius: f64, angle: f64) -> (i32, i32) {
    (
        (center.0 + radius * angle.cos()).round() as i32,
        (center.1 - radius * angle.sin()).round() as i32,
    )
}

/// Categories sit on integer positions 0..n
fn category_range(n: usize) -> Range<f64> {
    -0.5..(n as f64 - 0.5)
}

fn axis_range(axis: &AxisData) -> Range<f64> {
    match &axis.categories {
        Some(categories) => category_range(categories.len()),
        None => padded_range(axis.values.iter().copied()),
    }
}

fn label_count(axis: &AxisData) -> usize {
    axis.categories.as_ref().map(Vec::len).unwrap_or(10)
}

/// Data range with 5% padding; a single value gets +/- 1
fn padded_range<I: Iterator<Item = f64>>(values: I) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    if min == max {
        (min - 1.0)..(max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding)..(max + padding)
    }
}

fn tick_label(categories: &Option<Vec<String>>, value: f64) -> String {
    match categories {
        Some(categories) => {
            let rounded = value.round();
            if (value - rounded).abs() > 1e-6 || rounded < 0.0 {
                return String::new();
            }
            categories.get(rounded as usize).cloned().unwrap_or_default()
        }
        None if value.fract() == 0.0 => format!("{:.0}", value),
        None => format!("{:.2}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

    fn options() -> RenderOptions {
        RenderOptions {
            width: 320,
            height: 240,
            format: OutputFormat::Png,
        }
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([5.0].into_iter()), 4.0..6.0);
        let range = padded_range([0.0, 10.0].into_iter());
        assert!((range.start + 0.5).abs() < 1e-9);
        assert!((range.end - 10.5).abs() < 1e-9);
        assert_eq!(padded_range(std::iter::empty()), 0.0..1.0);
    }

    #[test]
    fn test_tick_label() {
        let cats = Some(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(tick_label(&cats, 1.0), "b");
        assert_eq!(tick_label(&cats, 0.5), "");
        assert_eq!(tick_label(&cats, 7.0), "");
        assert_eq!(tick_label(&None, 3.0), "3");
        assert_eq!(tick_label(&None, 2.5), "2.50");
    }

    #[test]
    fn test_to_pixel() {
        assert_eq!(to_pixel((100.0, 100.0), 10.0, PI / 2.0), (100, 90));
        assert_eq!(to_pixel((100.0, 100.0), 10.0, 0.0), (110, 100));
    }

    #[test]
    fn test_render_empty_figure_fails() {
        let figure = Figure::Bar {
            categories: vec![],
            values: vec![],
            hue: false,
        };
        let result = Canvas::new(&options(), None).render(&figure);
        assert!(result.unwrap_err().to_string().contains("no data"));
    }

    #[test]
    fn test_bar_label() {
        assert_eq!(bar_label(30.0), "30");
        assert_eq!(bar_label(12.9), "12");
    }

    #[test]
    fn test_pixel_buffer_len() {
        assert_eq!(pixel_buffer_len(320, 240).unwrap(), 320 * 240 * 3);
        assert!(pixel_buffer_len(u32::MAX, u32::MAX).is_err());
    }

    #[test]
    fn test_render_empty_png() {
        let bytes = Canvas::new(&options(), Some("Distribution of Likes for twitter".into()))
            .with_axis_labels(Some("Likes".into()), Some("Frequency".into()))
            .render_empty()
            .unwrap();
        assert_eq!(&bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_render_bar_png() {
        let figure = Figure::Bar {
            categories: vec!["2021".into(), "2022".into()],
            values: vec![10.0, 30.0],
            hue: true,
        };
        let bytes = Canvas::new(&options(), Some("Year vs Likes".into()))
            .render(&figure)
            .unwrap();
        assert_eq!(&bytes[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_render_pie_svg() {
        let figure = Figure::Pie {
            labels: vec!["usa".into(), "uk".into()],
            values: vec![3.0, 1.0],
        };
        let opts = RenderOptions {
            format: OutputFormat::Svg,
            ..options()
        };
        let bytes = Canvas::new(&opts, None).render(&figure).unwrap();
        assert!(String::from_utf8(bytes).unwrap().contains("<svg"));
    }
}
