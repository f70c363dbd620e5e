use cell_plots::params::{DEFAULT_CELL_TYPE, DEFAULT_THRESHOLD, DEFAULT_TITLE, format_float};
use cell_plots::{CellType, UnknownCellType, VizParams};
use clap::Parser;
use thiserror::Error;

const RULE_WIDTH: usize = 60;

#[derive(Error, Debug)]
pub enum ArgsError {
    #[error(transparent)]
    CellType(#[from] UnknownCellType),
}

/// Render the two-panel single-cell figure.
#[derive(Parser, Debug, Clone)]
#[command(name = "cellviz", version, allow_negative_numbers = true)]
pub struct Args {
    /// Expression threshold applied to both genes
    #[arg(default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Figure title
    #[arg(default_value = DEFAULT_TITLE, allow_hyphen_values = true)]
    pub title: String,

    /// Population to highlight: t_cells, b_cells, monocytes or nk_cells
    #[arg(default_value_t = DEFAULT_CELL_TYPE.to_string(), allow_hyphen_values = true)]
    pub cell_type: String,
}

impl Args {
    pub fn resolve(&self) -> Result<VizParams, ArgsError> {
        let cell_type: CellType = self.cell_type.parse()?;
        Ok(VizParams {
            threshold: self.threshold,
            title: self.title.clone(),
            cell_type,
        })
    }
}

pub fn summary(params: &VizParams, data_path: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    [
        format!("\n{rule}"),
        "Single Cell Data Visualization".to_string(),
        rule.clone(),
        format!("Data file:        {data_path}"),
        format!("Threshold:        {}", format_float(params.threshold)),
        format!("Title:            {}", params.title),
        format!("Highlighted Type: {}", params.cell_type.title_case()),
        format!("{rule}\n"),
    ]
    .join("\n")
}
