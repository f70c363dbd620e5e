use plotters::style::{Color, ShapeStyle};

use crate::colormap::RGB;
use crate::figure::FigureOptions;

pub static FIGURE_BACKGROUND: RGB = RGB::from_hex(0xffffff);
pub static AXES_BACKGROUND: RGB = RGB::from_hex(0xf8f9fa);
pub static ANNOTATION_BOX: RGB = RGB::from_hex(0xf5deb3);
pub static TEXT: RGB = RGB::from_hex(0x262626);

const WHITE: RGB = RGB::from_hex(0xffffff);
const GOLD: RGB = RGB::from_hex(0xffd700);
const RED: RGB = RGB::from_hex(0xff0000);

/// Scatter marker in matplotlib units: `area` in points², edge width in points.
#[derive(PartialEq, Clone, Debug)]
pub struct MarkerStyle {
    pub area: f64,
    pub alpha: f64,
    pub filled: bool,
    pub edge: RGB,
    pub edge_width: f64,
}

pub static BACKGROUND_CELL: MarkerStyle = MarkerStyle {
    area: 50.0,
    alpha: 0.6,
    filled: true,
    edge: WHITE,
    edge_width: 0.5,
};

pub static HIGHLIGHTED_CELL: MarkerStyle = MarkerStyle {
    area: 120.0,
    alpha: 0.9,
    filled: true,
    edge: GOLD,
    edge_width: 2.5,
};

pub static LEGEND_CELL: MarkerStyle = MarkerStyle {
    area: 50.0,
    alpha: 0.9,
    filled: true,
    edge: WHITE,
    edge_width: 0.5,
};

pub static EXPRESSION_CELL: MarkerStyle = MarkerStyle {
    area: 80.0,
    alpha: 0.6,
    filled: true,
    edge: WHITE,
    edge_width: 0.5,
};

pub static THRESHOLD_RING: MarkerStyle = MarkerStyle {
    area: 200.0,
    alpha: 0.7,
    filled: false,
    edge: RED,
    edge_width: 2.5,
};

impl MarkerStyle {
    pub fn radius_px(&self, options: &FigureOptions) -> i32 {
        options.pt_to_px(self.area.sqrt() / 2.0).round().max(1.0) as i32
    }

    pub fn fill_style(&self, color: RGB) -> ShapeStyle {
        color.to_plotters().mix(self.alpha).filled()
    }

    pub fn edge_style(&self, options: &FigureOptions) -> ShapeStyle {
        self.edge
            .to_plotters()
            .mix(self.alpha)
            .stroke_width(options.stroke_px(self.edge_width))
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct LineStyle {
    pub color: RGB,
    pub alpha: f64,
    pub width: f64,
    pub dashed: bool,
}

pub static THRESHOLD_LINE: LineStyle = LineStyle {
    color: RED,
    alpha: 0.8,
    width: 2.5,
    dashed: true,
};

pub static GRID_LINE: LineStyle = LineStyle {
    color: RGB::from_hex(0xb0b0b0),
    alpha: 0.3,
    width: 0.8,
    dashed: true,
};

pub static AXIS_LINE: LineStyle = LineStyle {
    color: RGB::from_hex(0xcccccc),
    alpha: 1.0,
    width: 1.25,
    dashed: false,
};

pub static LEGEND_FRAME: LineStyle = LineStyle {
    color: RGB::from_hex(0xcccccc),
    alpha: 0.8,
    width: 1.0,
    dashed: false,
};

impl LineStyle {
    pub fn shape_style(&self, options: &FigureOptions) -> ShapeStyle {
        self.color
            .to_plotters()
            .mix(self.alpha)
            .stroke_width(options.stroke_px(self.width))
    }

    /// Dash and gap lengths in pixels for the `--` pattern, scaled with the
    /// line width. `None` for solid lines.
    pub fn dash_px(&self, options: &FigureOptions) -> Option<(i32, i32)> {
        if !self.dashed {
            return None;
        }
        let scale = self.width.max(1.0);
        Some((
            options.pt_to_px(3.7 * scale).round().max(1.0) as i32,
            options.pt_to_px(1.6 * scale).round().max(1.0) as i32,
        ))
    }
}
