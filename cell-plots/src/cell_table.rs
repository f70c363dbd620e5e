use std::path::Path;

use polars::prelude::*;

use crate::cell_type::CellType;
use crate::file_load::{self, LoadError};

pub const X: &str = "x";
pub const Y: &str = "y";
pub const CELL_TYPES: &str = "cell_types";
pub const GENE1: &str = "gene1";
pub const GENE2: &str = "gene2";
pub const COLORS: &str = "colors";

/// Archive keys, in the order the loader reads them.
pub const COLUMNS: [&str; 6] = [X, Y, CELL_TYPES, GENE1, GENE2, COLORS];

/// The loaded bundle: one row per cell, six parallel columns.
#[derive(Debug, Clone)]
pub struct CellTable {
    frame: DataFrame,
}

impl CellTable {
    /// Columns must be named after [`COLUMNS`] and all share the length of `x`.
    pub fn new(columns: Vec<Column>) -> Result<Self, LoadError> {
        let expected = columns
            .iter()
            .find(|c| c.name().as_str() == X)
            .map(|c| c.len())
            .ok_or(LoadError::MissingColumn(X))?;

        for name in COLUMNS {
            let column = columns
                .iter()
                .find(|c| c.name().as_str() == name)
                .ok_or(LoadError::MissingColumn(name))?;
            if column.len() != expected {
                return Err(LoadError::LengthMismatch {
                    name,
                    expected,
                    found: column.len(),
                });
            }
        }

        let frame = DataFrame::new(columns)?;
        Ok(Self { frame })
    }

    pub fn from_cells(cells: &Cells) -> Result<Self, LoadError> {
        Self::new(vec![
            Column::new(X.into(), &cells.x),
            Column::new(Y.into(), &cells.y),
            Column::new(CELL_TYPES.into(), &cells.cell_types),
            Column::new(GENE1.into(), &cells.gene1),
            Column::new(GENE2.into(), &cells.gene2),
            Column::new(COLORS.into(), &cells.colors),
        ])
    }

    pub fn load(path: &Path) -> Result<Self, LoadError> {
        file_load::load_cell_table(path)
    }

    pub fn len(&self) -> usize {
        self.frame.height()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    fn float_column(&self, name: &str) -> Result<Vec<f64>, PolarsError> {
        let column = self.frame.column(name)?.cast(&DataType::Float64)?;
        let ca = column.f64().map_err(|e| {
            PolarsError::ComputeError(format!("Failed to get f64 data from {name}: {e}").into())
        })?;
        Ok(ca.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    }

    fn string_column(&self, name: &str) -> Result<Vec<String>, PolarsError> {
        let column = self.frame.column(name)?;
        let ca = column.str().map_err(|e| {
            PolarsError::ComputeError(format!("Failed to get string data from {name}: {e}").into())
        })?;
        Ok(ca
            .into_iter()
            .map(|v| v.map(str::to_string).unwrap_or_default())
            .collect())
    }

    /// Materialises the columns for drawing.
    pub fn cells(&self) -> Result<Cells, PolarsError> {
        Ok(Cells {
            x: self.float_column(X)?,
            y: self.float_column(Y)?,
            cell_types: self.string_column(CELL_TYPES)?,
            gene1: self.float_column(GENE1)?,
            gene2: self.float_column(GENE2)?,
            colors: self.string_column(COLORS)?,
        })
    }
}

/// Plain vectors of one table; index `i` across all six is one cell.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cells {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub cell_types: Vec<String>,
    pub gene1: Vec<f64>,
    pub gene2: Vec<f64>,
    pub colors: Vec<String>,
}

impl Cells {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// True when all six columns have the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.len();
        [
            self.y.len(),
            self.cell_types.len(),
            self.gene1.len(),
            self.gene2.len(),
            self.colors.len(),
        ]
        .iter()
        .all(|&len| len == n)
    }

    /// Exact label match against the type's archive key.
    pub fn highlight_mask(&self, cell_type: CellType) -> Vec<bool> {
        let key = cell_type.key();
        self.cell_types.iter().map(|label| label == key).collect()
    }

    pub fn above_threshold_mask(&self, threshold: f64) -> Vec<bool> {
        above_threshold(&self.gene1, &self.gene2, threshold)
    }

    pub fn count_above_threshold(&self, threshold: f64) -> usize {
        self.above_threshold_mask(threshold)
            .into_iter()
            .filter(|&above| above)
            .count()
    }
}

/// `gene1 > t && gene2 > t`, strictly on both axes; NaN never passes.
pub fn above_threshold(gene1: &[f64], gene2: &[f64], threshold: f64) -> Vec<bool> {
    gene1
        .iter()
        .zip(gene2)
        .map(|(&g1, &g2)| g1 > threshold && g2 > threshold)
        .collect()
}
