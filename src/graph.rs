use crate::data::format_number;
use crate::ir::{AxisSide, ChartSpec, Datum, SeriesDescriptor};
use crate::mapping::ChartKind;
use crate::transform::PIE_VALUE_FIELD;
use crate::{OutputFormat, RenderOptions};
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::f64::consts::PI;
use std::ops::Range;

const FONT: &str = "sans-serif";
const BAR_GROUP_WIDTH: f64 = 0.8;

/// Rasterise or vectorise a chart spec according to the render options
pub fn render(spec: &ChartSpec, options: &RenderOptions) -> Result<Vec<u8>> {
    match options.format {
        OutputFormat::Png => render_png(spec, options.width, options.height),
        OutputFormat::Svg => render_svg(spec, options.width, options.height),
    }
}

/// Draw into an RGB bitmap and encode it as PNG
pub fn render_png(spec: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_drawable(spec)?;

    let mut buffer = vec![0u8; (width * height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        draw_chart(&root, spec)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, width, height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }
    tracing::debug!(bytes = png_bytes.len(), "encoded PNG");

    Ok(png_bytes)
}

pub fn render_svg(spec: &ChartSpec, width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_drawable(spec)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (width, height)).into_drawing_area();
        draw_chart(&root, spec)?;
        root.present().context("Failed to present drawing")?;
    }

    Ok(svg.into_bytes())
}

fn ensure_drawable(spec: &ChartSpec) -> Result<()> {
    if spec.is_empty() {
        anyhow::bail!("Cannot render a chart with no data");
    }
    Ok(())
}

fn draw_chart<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB::ErrorType: 'static,
{
    root.fill(&WHITE).context("Failed to fill background")?;
    if spec.kind.is_pie() && !spec.is_composed() {
        draw_pie(root, spec)
    } else {
        draw_cartesian(root, spec)
    }
}

/// Category label for each row, in row order.
fn categories(spec: &ChartSpec) -> Vec<String> {
    let key = spec.x_key.as_deref().unwrap_or_default();
    spec.data
        .iter()
        .map(|row| match row.get(key) {
            Some(Datum::Text(s)) => s.clone(),
            Some(Datum::Number(n)) => format_number(*n),
            None => String::new(),
        })
        .collect()
}

/// Points of one series; rows without the value are skipped.
fn series_points(spec: &ChartSpec, series: &SeriesDescriptor) -> Vec<(f64, f64)> {
    spec.data
        .iter()
        .enumerate()
        .filter_map(|(idx, row)| row.number(&series.data_key).map(|y| (idx as f64, y)))
        .collect()
}

fn value_range<'a>(points: impl Iterator<Item = &'a (f64, f64)>) -> Range<f64> {
    // bars grow from zero, so zero is always in range
    let (min, max) = points.fold((0.0f64, 0.0f64), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));
    if max - min < f64::EPSILON {
        return min..(min + 1.0);
    }
    let padding = (max - min) * 0.05;
    let low = if min < 0.0 { min - padding } else { min };
    low..(max + padding)
}

fn on_right(series: &SeriesDescriptor) -> bool {
    series.axis == AxisSide::Right
}

fn draws_as_bar(kind: ChartKind) -> bool {
    matches!(kind, ChartKind::Bar | ChartKind::Pie)
}

macro_rules! draw_kind {
    ($chart:expr, $draw:ident, $kind:expr, $points:expr, $color:expr, $slot:expr, $slots:expr) => {
        match $kind {
            ChartKind::Line => $chart.$draw(LineSeries::new($points.iter().copied(), $color.stroke_width(2))),
            ChartKind::Area => $chart.$draw(
                AreaSeries::new($points.iter().copied(), 0.0, $color.mix(0.3)).border_style($color.stroke_width(2)),
            ),
            ChartKind::Scatter => $chart.$draw($points.iter().map(|&p| Circle::new(p, 4, $color.filled()))),
            ChartKind::Bar | ChartKind::Pie => {
                let bar_width = BAR_GROUP_WIDTH / $slots as f64;
                let offset = ($slot as f64 - ($slots as f64 - 1.0) / 2.0) * bar_width;
                $chart.$draw($points.iter().map(|&(x, y)| {
                    let center = x + offset;
                    Rectangle::new(
                        [(center - bar_width / 2.0, 0.0), (center + bar_width / 2.0, y)],
                        $color.filled(),
                    )
                }))
            }
        }
    };
}

fn draw_cartesian<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let labels = categories(spec);
    let x_range = -0.5..(labels.len() as f64 - 0.5);

    let plotted: Vec<(&SeriesDescriptor, Vec<(f64, f64)>)> =
        spec.series.iter().map(|s| (s, series_points(spec, s))).collect();
    let has_right = plotted.iter().any(|(s, _)| on_right(s));

    let left_range = value_range(plotted.iter().filter(|(s, _)| !on_right(s)).flat_map(|(_, p)| p.iter()));
    let right_range = if has_right {
        value_range(plotted.iter().filter(|(s, _)| on_right(s)).flat_map(|(_, p)| p.iter()))
    } else {
        left_range.clone()
    };

    let mut chart = ChartBuilder::on(root)
        .margin(10)
        .caption(&spec.title, (FONT, 20))
        .x_label_area_size(40)
        .y_label_area_size(50)
        .right_y_label_area_size(if has_right { 50 } else { 0 })
        .build_cartesian_2d(x_range.clone(), left_range)
        .context("Failed to build chart")?
        .set_secondary_coord(x_range, right_range);

    let label_for = |x: &f64| {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    };

    {
        let mut mesh = chart.configure_mesh();
        mesh.x_labels(labels.len()).x_label_formatter(&label_for);
        if !spec.show_grid {
            mesh.disable_mesh();
        }
        if let Some(desc) = &spec.x_axis_label {
            mesh.x_desc(desc.as_str());
        }
        if let Some(desc) = &spec.y_axis_label {
            mesh.y_desc(desc.as_str());
        }
        mesh.draw().context("Failed to draw mesh")?;
    }
    if has_right {
        chart
            .configure_secondary_axes()
            .draw()
            .context("Failed to draw secondary axis")?;
    }

    let slots = plotted.iter().filter(|(s, _)| draws_as_bar(s.kind)).count().max(1);
    let mut slot = 0;
    for (series, points) in &plotted {
        let color = parse_color(&series.color);
        let drawn = if on_right(series) {
            draw_kind!(chart, draw_secondary_series, series.kind, points, color, slot, slots)
        } else {
            draw_kind!(chart, draw_series, series.kind, points, color, slot, slots)
        };
        let anno = drawn.with_context(|| format!("Failed to draw series '{}'", series.data_key))?;
        anno.label(series.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));

        if draws_as_bar(series.kind) {
            slot += 1;
        }
    }

    if spec.show_legend && !plotted.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .context("Failed to draw legend")?;
    }

    Ok(())
}

fn draw_pie<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, spec: &ChartSpec) -> Result<()>
where
    DB::ErrorType: 'static,
{
    let area = root
        .titled(&spec.title, (FONT, 20))
        .context("Failed to draw title")?;

    let names = categories(spec);
    let values: Vec<f64> = spec
        .data
        .iter()
        .map(|row| row.number(PIE_VALUE_FIELD).unwrap_or(0.0).max(0.0))
        .collect();
    let total: f64 = values.iter().sum();
    if total <= 0.0 {
        tracing::debug!("pie has no positive values, drawing title only");
        return Ok(());
    }

    let (width, height) = area.dim_in_pixel();
    let center = (width as f64 / 2.0, height as f64 / 2.0);
    let radius = width.min(height) as f64 * 0.35;

    // wedges start at twelve o'clock and run clockwise
    let mut start = -PI / 2.0;
    for (idx, (name, value)) in names.iter().zip(&values).enumerate() {
        let sweep = value / total * 2.0 * PI;
        if sweep <= 0.0 {
            continue;
        }
        let color = parse_color(spec.slice_colors.get(idx).map(String::as_str).unwrap_or_default());

        let steps = ((sweep / (2.0 * PI)) * 90.0).ceil().max(2.0) as usize;
        let mut wedge = vec![(center.0 as i32, center.1 as i32)];
        wedge.extend((0..=steps).map(|step| {
            let angle = start + sweep * step as f64 / steps as f64;
            (
                (center.0 + radius * angle.cos()) as i32,
                (center.1 + radius * angle.sin()) as i32,
            )
        }));
        area.draw(&Polygon::new(wedge, color.filled()))
            .context("Failed to draw pie slice")?;

        if spec.show_legend {
            let mid = start + sweep / 2.0;
            let anchor = (
                (center.0 + radius * 1.15 * mid.cos()) as i32,
                (center.1 + radius * 1.15 * mid.sin()) as i32,
            );
            area.draw(&Text::new(name.clone(), anchor, (FONT, 14)))
                .context("Failed to draw pie label")?;
        }
        start += sweep;
    }

    Ok(())
}

/// Parse `#rrggbb` or a basic colour name; anything else falls back to blue
fn parse_color(color: &str) -> RGBColor {
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() == 6 {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (channel(0), channel(2), channel(4)) {
                return RGBColor(r, g, b);
            }
        }
        return BLUE;
    }

    match color {
        "red" => RED,
        "green" => GREEN,
        "blue" => BLUE,
        "black" => BLACK,
        "yellow" => YELLOW,
        "cyan" => CYAN,
        "magenta" => MAGENTA,
        "white" => WHITE,
        _ => BLUE,
    }
}
