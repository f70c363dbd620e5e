use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage, imageops};
use plotters::chart::SeriesAnno;
use plotters::coord::Shift;
use plotters::coord::ranged1d::BoldPoints;
use plotters::coord::types::RangedCoordf64;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::{FontStyle, register_font};
use plotters_bitmap::BitMapBackend;
use thiserror::Error;
use tracing::{debug, info};

use crate::axis_info::AxisInfo;
use crate::cell_table::Cells;
use crate::cell_type::CellType;
use crate::colormap::{ColorError, RGB};
use crate::params::{VizParams, format_float};
use crate::styles::{
    ANNOTATION_BOX, AXES_BACKGROUND, AXIS_LINE, BACKGROUND_CELL, EXPRESSION_CELL,
    FIGURE_BACKGROUND, GRID_LINE, HIGHLIGHTED_CELL, LEGEND_CELL, LEGEND_FRAME, LineStyle,
    MarkerStyle, TEXT, THRESHOLD_LINE, THRESHOLD_RING,
};

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/fonts/DejaVuSans.ttf");
static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../assets/fonts/DejaVuSans-Bold.ttf");
static FONTS_REGISTERED: OnceLock<bool> = OnceLock::new();
const GRID_LINES: usize = 11;

pub type FigureArea<'a> = DrawingArea<BitMapBackend<'a>, Shift>;
type Chart<'a, 'b> = ChartContext<'a, BitMapBackend<'b>, Cartesian2d<RangedCoordf64, RangedCoordf64>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("drawing failed: {0}")]
    Draw(String),
    #[error(transparent)]
    Color(#[from] ColorError),
    #[error("embedded font could not be registered")]
    Font,
    #[error("cell columns have unequal lengths")]
    UnequalColumns,
    #[error("png encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("could not write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

/// Physical figure size. Every style is given in points and scaled by `dpi / 72`.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureOptions {
    pub width_in: f64,
    pub height_in: f64,
    pub dpi: f64,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            width_in: 16.0,
            height_in: 7.0,
            dpi: 300.0,
        }
    }
}

impl FigureOptions {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi).round().max(1.0) as u32,
            (self.height_in * self.dpi).round().max(1.0) as u32,
        )
    }

    pub fn pt_to_px(&self, pt: f64) -> f64 {
        pt * self.dpi / 72.0
    }

    pub fn stroke_px(&self, pt: f64) -> u32 {
        self.pt_to_px(pt).round().max(1.0) as u32
    }

    fn size_px(&self, pt: f64) -> i32 {
        self.pt_to_px(pt).round() as i32
    }

    fn font(&self, pt: f64, style: FontStyle) -> TextStyle<'static> {
        FontDesc::new(FontFamily::SansSerif, self.pt_to_px(pt), style).color(&TEXT.to_plotters())
    }
}

/// An encoded PNG, trimmed to its content.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    png: Vec<u8>,
    width: u32,
    height: u32,
}

impl Figure {
    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Writes the PNG, replacing whatever is at `path`.
    pub fn save(&self, path: &Path) -> Result<(), RenderError> {
        fs::write(path, &self.png).map_err(|source| RenderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), bytes = self.png.len(), "figure saved");
        Ok(())
    }
}

/// One row of the cell type legend.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: RGB,
    pub marker: &'static MarkerStyle,
    pub selected: bool,
}

/// All four types in table order; only `selected` gets the highlighted marker
/// and the `(Selected)` suffix.
pub fn legend_entries(selected: CellType) -> Vec<LegendEntry> {
    CellType::ALL
        .iter()
        .map(|&cell_type| {
            let is_selected = cell_type == selected;
            LegendEntry {
                label: if is_selected {
                    format!("{} (Selected)", cell_type.label())
                } else {
                    cell_type.label().to_string()
                },
                color: cell_type.color(),
                marker: if is_selected {
                    &HIGHLIGHTED_CELL
                } else {
                    &LEGEND_CELL
                },
                selected: is_selected,
            }
        })
        .collect()
}

pub fn annotation_text(above: usize, total: usize) -> String {
    format!("Cells above threshold: {above}/{total}")
}

fn register_fonts() -> Result<(), RenderError> {
    let registered = FONTS_REGISTERED.get_or_init(|| {
        register_font("sans-serif", FontStyle::Normal, DEJAVU_SANS).is_ok()
            && register_font("sans-serif", FontStyle::Bold, DEJAVU_SANS_BOLD).is_ok()
    });
    if *registered {
        Ok(())
    } else {
        Err(RenderError::Font)
    }
}

/// Draws both panels and returns the trimmed PNG. Nothing touches the
/// filesystem here; see [`Figure::save`].
pub fn render_figure(
    cells: &Cells,
    params: &VizParams,
    options: &FigureOptions,
) -> Result<Figure, RenderError> {
    register_fonts()?;
    if !cells.is_consistent() {
        return Err(RenderError::UnequalColumns);
    }
    let colors = cells
        .colors
        .iter()
        .map(|c| RGB::parse(c))
        .collect::<Result<Vec<_>, _>>()?;

    let (width, height) = options.pixel_size();
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root: FigureArea = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
        root.fill(&FIGURE_BACKGROUND.to_plotters())?;

        let pad = options.size_px(10.0);
        let body = root
            .margin(pad, pad, pad, pad)
            .titled(&params.title, options.font(20.0, FontStyle::Bold))?;
        let (left, right) = body.split_horizontally(body.dim_in_pixel().0 / 2);

        draw_cell_types(&left, cells, &colors, params.cell_type, options)?;
        draw_expression(&right, cells, &colors, params.threshold, options)?;
        root.present()?;
    }

    let image = RgbImage::from_raw(width, height, buffer)
        .ok_or_else(|| RenderError::Draw("bitmap buffer has the wrong size".to_string()))?;
    let background = FIGURE_BACKGROUND;
    let trimmed = trim_margins(
        &image,
        Rgb([background.r, background.g, background.b]),
        options.pt_to_px(7.2).round() as u32,
    );

    let (width, height) = trimmed.dimensions();
    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(trimmed.as_raw(), width, height, ExtendedColorType::Rgb8)?;
    debug!(width, height, bytes = png.len(), "figure encoded");

    Ok(Figure { png, width, height })
}

/// Crops to the bounding box of non-background pixels plus `pad` on each side.
fn trim_margins(image: &RgbImage, background: Rgb<u8>, pad: u32) -> RgbImage {
    let bounds = image
        .enumerate_pixels()
        .filter(|(_, _, px)| **px != background)
        .fold(None, |acc: Option<(u32, u32, u32, u32)>, (x, y, _)| {
            Some(match acc {
                None => (x, y, x, y),
                Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
            })
        });
    let Some((x0, y0, x1, y1)) = bounds else {
        return image.clone();
    };

    let (width, height) = image.dimensions();
    let left = x0.saturating_sub(pad);
    let top = y0.saturating_sub(pad);
    let right = (x1 + pad + 1).min(width);
    let bottom = (y1 + pad + 1).min(height);
    imageops::crop_imm(image, left, top, right - left, bottom - top).to_image()
}

fn build_chart<'a, 'b>(
    area: &'a FigureArea<'b>,
    caption: &str,
    x_axis: &AxisInfo,
    y_axis: &AxisInfo,
    options: &FigureOptions,
) -> Result<Chart<'a, 'b>, RenderError> {
    let mut chart = ChartBuilder::on(area)
        .caption(caption, options.font(16.0, FontStyle::Bold))
        .margin(options.size_px(15.0))
        .x_label_area_size(options.size_px(45.0))
        .y_label_area_size(options.size_px(60.0))
        .build_cartesian_2d(x_axis.range(), y_axis.range())?;

    chart.plotting_area().fill(&AXES_BACKGROUND.to_plotters())?;
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(GRID_LINES)
        .y_labels(GRID_LINES)
        .axis_style(AXIS_LINE.shape_style(options))
        .set_all_tick_mark_size(0)
        .x_desc(&*x_axis.title)
        .y_desc(&*y_axis.title)
        .axis_desc_style(options.font(14.0, FontStyle::Bold))
        .label_style(options.font(10.0, FontStyle::Normal))
        .draw()?;
    draw_grid(&mut chart, options)?;
    Ok(chart)
}

/// Dashed grid at the labelled ticks. The mesh only draws solid lines.
fn draw_grid(chart: &mut Chart, options: &FigureOptions) -> Result<(), RenderError> {
    let spec = chart.as_coord_spec();
    let (x_range, y_range) = (spec.x_spec().range(), spec.y_spec().range());
    let xs = spec.x_spec().key_points(BoldPoints(GRID_LINES));
    let ys = spec.y_spec().key_points(BoldPoints(GRID_LINES));

    for x in xs {
        draw_line(chart, vec![(x, y_range.start), (x, y_range.end)], &GRID_LINE, options)?;
    }
    for y in ys {
        draw_line(chart, vec![(x_range.start, y), (x_range.end, y)], &GRID_LINE, options)?;
    }
    Ok(())
}

fn draw_markers(
    chart: &mut Chart,
    points: &[(f64, f64, RGB)],
    marker: &MarkerStyle,
    options: &FigureOptions,
) -> Result<(), RenderError> {
    let radius = marker.radius_px(options);
    let edge = marker.edge_style(options);
    chart.draw_series(
        points
            .iter()
            .filter(|(x, y, _)| x.is_finite() && y.is_finite())
            .map(|&(x, y, color)| {
                let fill = if marker.filled {
                    marker.fill_style(color)
                } else {
                    TRANSPARENT.filled()
                };
                EmptyElement::at((x, y))
                    + Circle::new((0, 0), radius, fill)
                    + Circle::new((0, 0), radius, edge)
            }),
    )?;
    Ok(())
}

fn draw_line<'c, 'a, 'b>(
    chart: &'c mut Chart<'a, 'b>,
    points: Vec<(f64, f64)>,
    line: &LineStyle,
    options: &FigureOptions,
) -> Result<&'c mut SeriesAnno<'a, BitMapBackend<'b>>, RenderError> {
    let style = line.shape_style(options);
    let anno = match line.dash_px(options) {
        Some((dash, gap)) => chart.draw_series(DashedLineSeries::new(points, dash, gap, style))?,
        None => chart.draw_series(LineSeries::new(points, style))?,
    };
    Ok(anno)
}

fn draw_legend<'a, 'b: 'a>(
    chart: &mut Chart<'a, 'b>,
    options: &FigureOptions,
) -> Result<(), RenderError> {
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .margin(options.size_px(6.0))
        .legend_area_size(options.size_px(24.0))
        .background_style(FIGURE_BACKGROUND.to_plotters().mix(0.8))
        .border_style(LEGEND_FRAME.shape_style(options))
        .label_font(options.font(11.0, FontStyle::Normal))
        .draw()?;
    Ok(())
}

fn draw_cell_types(
    area: &FigureArea,
    cells: &Cells,
    colors: &[RGB],
    selected: CellType,
    options: &FigureOptions,
) -> Result<(), RenderError> {
    let x_axis = AxisInfo::from_values("UMAP 1", &cells.x, None);
    let y_axis = AxisInfo::from_values("UMAP 2", &cells.y, None);
    let mut chart = build_chart(area, "Cell Type Clustering", &x_axis, &y_axis, options)?;

    let highlight = cells.highlight_mask(selected);
    let (highlighted, background): (Vec<_>, Vec<_>) = (0..cells.len())
        .map(|i| (highlight[i], (cells.x[i], cells.y[i], colors[i])))
        .partition(|(is_highlighted, _)| *is_highlighted);
    let strip = |points: Vec<(bool, (f64, f64, RGB))>| points.into_iter().map(|(_, p)| p).collect::<Vec<_>>();

    draw_markers(&mut chart, &strip(background), &BACKGROUND_CELL, options)?;
    draw_markers(&mut chart, &strip(highlighted), &HIGHLIGHTED_CELL, options)?;

    let offset = options.size_px(12.0);
    for entry in legend_entries(selected) {
        let radius = entry.marker.radius_px(options);
        let fill = entry.marker.fill_style(entry.color);
        let edge = entry.marker.edge_style(options);
        chart
            .draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(entry.label)
            .legend(move |(x, y)| {
                EmptyElement::at((x + offset, y))
                    + Circle::new((0, 0), radius, fill)
                    + Circle::new((0, 0), radius, edge)
            });
    }
    draw_legend(&mut chart, options)?;
    debug!(highlighted = highlight.iter().filter(|&&h| h).count(), %selected, "drew cell type panel");
    Ok(())
}

fn draw_expression(
    area: &FigureArea,
    cells: &Cells,
    colors: &[RGB],
    threshold: f64,
    options: &FigureOptions,
) -> Result<(), RenderError> {
    let include = threshold.is_finite().then_some(threshold);
    let x_axis = AxisInfo::from_values("Gene 1 Expression", &cells.gene1, include);
    let y_axis = AxisInfo::from_values("Gene 2 Expression", &cells.gene2, include);
    let caption = format!("Gene Expression (Threshold: {})", format_float(threshold));
    let mut chart = build_chart(area, &caption, &x_axis, &y_axis, options)?;

    let points: Vec<_> = (0..cells.len())
        .map(|i| (cells.gene1[i], cells.gene2[i], colors[i]))
        .collect();
    draw_markers(&mut chart, &points, &EXPRESSION_CELL, options)?;

    let (horizontal, vertical) = if x_axis.contains(threshold) && y_axis.contains(threshold) {
        (
            vec![(x_axis.lower, threshold), (x_axis.upper, threshold)],
            vec![(threshold, y_axis.lower), (threshold, y_axis.upper)],
        )
    } else {
        (Vec::new(), Vec::new())
    };
    let legend_line = THRESHOLD_LINE.shape_style(options);
    let legend_len = options.size_px(24.0);
    draw_line(&mut chart, horizontal, &THRESHOLD_LINE, options)?
        .label(format!("Threshold = {}", format_float(threshold)))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + legend_len, y)], legend_line));
    draw_line(&mut chart, vertical, &THRESHOLD_LINE, options)?;

    let mask = cells.above_threshold_mask(threshold);
    let rings: Vec<_> = points
        .iter()
        .zip(&mask)
        .filter(|(_, above)| **above)
        .map(|(&(x, y, _), _)| (x, y, THRESHOLD_RING.edge))
        .collect();
    draw_markers(&mut chart, &rings, &THRESHOLD_RING, options)?;
    draw_legend(&mut chart, options)?;

    let text = annotation_text(rings.len(), cells.len());
    draw_annotation(&chart, &text, options)?;
    debug!(above = rings.len(), total = cells.len(), "drew expression panel");
    Ok(())
}

/// Text in a wheat box pinned 2% in from the plotting area's top-left corner.
fn draw_annotation(chart: &Chart, text: &str, options: &FigureOptions) -> Result<(), RenderError> {
    let area = chart.plotting_area().strip_coord_spec();
    let (width, height) = area.dim_in_pixel();
    let style = options.font(11.0, FontStyle::Normal);
    let (text_w, text_h) = area.estimate_text_size(text, &style)?;

    let pad = options.size_px(4.0);
    let x0 = (width as f64 * 0.02).round() as i32;
    let y0 = (height as f64 * 0.02).round() as i32;
    let corners = [
        (x0, y0),
        (x0 + text_w as i32 + 2 * pad, y0 + text_h as i32 + 2 * pad),
    ];
    area.draw(&Rectangle::new(corners, ANNOTATION_BOX.to_plotters().mix(0.7).filled()))?;
    area.draw(&Rectangle::new(
        corners,
        BLACK.mix(0.7).stroke_width(options.stroke_px(1.0)),
    ))?;
    area.draw(&Text::new(text, (x0 + pad, y0 + pad), style))?;
    Ok(())
}
