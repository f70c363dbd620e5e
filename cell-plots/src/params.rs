use crate::cell_type::CellType;

pub const DEFAULT_THRESHOLD: f64 = 2.0;
pub const DEFAULT_TITLE: &str = "Single Cell Analysis";
pub const DEFAULT_CELL_TYPE: CellType = CellType::TCells;

/// Everything the renderer needs besides the data itself.
#[derive(Debug, Clone, PartialEq)]
pub struct VizParams {
    /// Applied to both expression axes; no range constraint.
    pub threshold: f64,
    /// Figure suptitle, free text.
    pub title: String,
    /// The population drawn on top with the gold outline.
    pub cell_type: CellType,
}

impl Default for VizParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            title: DEFAULT_TITLE.to_string(),
            cell_type: DEFAULT_CELL_TYPE,
        }
    }
}

/// Prints floats the way the plots have always labelled them: shortest
/// round-trip digits, a trailing `.0` on integral values (`2.0`), and
/// exponent form (`1e-05`, `1.5e+16`) below `1e-4` or from `1e16` up.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    let scientific = format!("{value:e}");
    if let Some((mantissa, exponent)) = scientific.split_once('e') {
        if let Ok(exponent) = exponent.parse::<i32>() {
            if value != 0.0 && !(-4..16).contains(&exponent) {
                let sign = if exponent < 0 { '-' } else { '+' };
                return format!("{mantissa}e{sign}{:02}", exponent.abs());
            }
        }
    }

    let fixed = format!("{value}");
    if fixed.contains('.') {
        fixed
    } else {
        format!("{fixed}.0")
    }
}
