use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek};
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;
use tracing::debug;

use crate::cell_table::{self, CellTable};
use crate::colormap::{ColorError, RGB};
use crate::npz::{NpyArray, NpyData, NpyError, NpzArchive};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("File '{}' not found!", .path.display())]
    NotFound { path: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Npz(#[from] NpyError),
    #[error("column '{0}' is missing")]
    MissingColumn(&'static str),
    #[error("array '{name}' holds {found} values, expected {expected}")]
    WrongKind {
        name: &'static str,
        expected: &'static str,
        found: &'static str,
    },
    #[error("array '{name}' has {found} entries but 'x' has {expected}")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("array '{name}' must be one-dimensional, got shape {shape:?}")]
    Shape {
        name: &'static str,
        shape: Vec<usize>,
    },
    #[error("array 'colors': {0}")]
    Color(#[from] ColorError),
    #[error(transparent)]
    Table(#[from] PolarsError),
}

/// Reads the six-array bundle at `path` into a [`CellTable`].
pub fn load_cell_table(path: &Path) -> Result<CellTable, LoadError> {
    let file = File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoadError::NotFound {
            path: path.to_path_buf(),
        },
        _ => LoadError::Io(e),
    })?;
    let table = read_cell_table(BufReader::new(file))?;
    debug!(path = %path.display(), cells = table.len(), "loaded cell table");
    Ok(table)
}

/// Same as [`load_cell_table`] for an archive already in memory or open.
pub fn read_cell_table<R: Read + Seek>(reader: R) -> Result<CellTable, LoadError> {
    let mut archive = NpzArchive::new(reader)?;
    debug!(members = ?archive.names(), "opened npz archive");

    let columns = vec![
        float_column(cell_table::X, archive.by_name(cell_table::X)?)?,
        float_column(cell_table::Y, archive.by_name(cell_table::Y)?)?,
        text_column(cell_table::CELL_TYPES, archive.by_name(cell_table::CELL_TYPES)?)?,
        float_column(cell_table::GENE1, archive.by_name(cell_table::GENE1)?)?,
        float_column(cell_table::GENE2, archive.by_name(cell_table::GENE2)?)?,
        color_column(cell_table::COLORS, archive.by_name(cell_table::COLORS)?)?,
    ];
    CellTable::new(columns)
}

fn one_dimensional(name: &'static str, array: &NpyArray) -> Result<(), LoadError> {
    if array.shape.len() == 1 {
        Ok(())
    } else {
        Err(LoadError::Shape {
            name,
            shape: array.shape.clone(),
        })
    }
}

fn float_column(name: &'static str, array: NpyArray) -> Result<Column, LoadError> {
    one_dimensional(name, &array)?;
    let values: Vec<f64> = match array.data {
        NpyData::Float(v) => v,
        NpyData::Int(v) => v.into_iter().map(|i| i as f64).collect(),
        NpyData::Bool(v) => v.into_iter().map(|b| if b { 1.0 } else { 0.0 }).collect(),
        other => {
            return Err(LoadError::WrongKind {
                name,
                expected: "numeric",
                found: other.kind_name(),
            });
        }
    };
    Ok(Column::new(name.into(), values))
}

fn text_column(name: &'static str, array: NpyArray) -> Result<Column, LoadError> {
    one_dimensional(name, &array)?;
    match array.data {
        NpyData::Text(v) => Ok(Column::new(name.into(), v)),
        other => Err(LoadError::WrongKind {
            name,
            expected: "string",
            found: other.kind_name(),
        }),
    }
}

/// Colors come either as strings (hex or named) or as an `N x 3`/`N x 4`
/// numeric array; both end up as `#rrggbb` strings after validation.
fn color_column(name: &'static str, array: NpyArray) -> Result<Column, LoadError> {
    let hex: Vec<String> = match (&array.data, array.shape.len()) {
        (NpyData::Text(values), 1) => values
            .iter()
            .map(|v| RGB::parse(v).map(|rgb| rgb.to_hex_string()))
            .collect::<Result<_, _>>()?,
        (NpyData::Float(_) | NpyData::Int(_), 2) => {
            let integer = matches!(array.data, NpyData::Int(_));
            array
                .numeric_rows()
                .ok_or_else(|| LoadError::Shape {
                    name,
                    shape: array.shape.clone(),
                })?
                .iter()
                .map(|row| RGB::from_components(row, integer).map(|rgb| rgb.to_hex_string()))
                .collect::<Result<_, _>>()?
        }
        (NpyData::Text(_), _) | (NpyData::Float(_) | NpyData::Int(_), _) => {
            return Err(LoadError::Shape {
                name,
                shape: array.shape.clone(),
            });
        }
        (other, _) => {
            return Err(LoadError::WrongKind {
                name,
                expected: "string or RGB",
                found: other.kind_name(),
            });
        }
    };
    Ok(Column::new(name.into(), hex))
}
