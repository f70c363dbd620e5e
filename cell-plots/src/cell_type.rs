use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::colormap::RGB;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid cell type '{given}'")]
pub struct UnknownCellType {
    pub given: String,
}

/// The closed set of populations the clustering panel knows how to label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellType {
    #[default]
    TCells,
    BCells,
    Monocytes,
    NkCells,
}

pub struct CellTypeStyle {
    pub key: &'static str,
    pub label: &'static str,
    pub color: RGB,
}

static T_CELLS: CellTypeStyle = CellTypeStyle {
    key: "t_cells",
    label: "T Cells",
    color: RGB::from_hex(0xe74c3c),
};

static B_CELLS: CellTypeStyle = CellTypeStyle {
    key: "b_cells",
    label: "B Cells",
    color: RGB::from_hex(0x3498db),
};

static MONOCYTES: CellTypeStyle = CellTypeStyle {
    key: "monocytes",
    label: "Monocytes",
    color: RGB::from_hex(0x2ecc71),
};

static NK_CELLS: CellTypeStyle = CellTypeStyle {
    key: "nk_cells",
    label: "NK Cells",
    color: RGB::from_hex(0xf39c12),
};

impl CellType {
    /// Legend order.
    pub const ALL: [CellType; 4] = [
        CellType::TCells,
        CellType::BCells,
        CellType::Monocytes,
        CellType::NkCells,
    ];

    pub fn style(&self) -> &'static CellTypeStyle {
        match self {
            CellType::TCells => &T_CELLS,
            CellType::BCells => &B_CELLS,
            CellType::Monocytes => &MONOCYTES,
            CellType::NkCells => &NK_CELLS,
        }
    }

    /// The label as it is stored in the `cell_types` array.
    pub fn key(&self) -> &'static str {
        self.style().key
    }

    pub fn label(&self) -> &'static str {
        self.style().label
    }

    pub fn color(&self) -> RGB {
        self.style().color
    }

    /// `nk_cells` -> `Nk Cells`
    pub fn title_case(&self) -> String {
        self.key()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn valid_keys() -> String {
        Self::ALL
            .iter()
            .map(|ct| ct.key())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromStr for CellType {
    type Err = UnknownCellType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ct| ct.key() == s)
            .ok_or_else(|| UnknownCellType {
                given: s.to_string(),
            })
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
