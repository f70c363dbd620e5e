pub mod axis_info;
pub mod cell_table;
pub mod cell_type;
pub mod colormap;
pub mod figure;
pub mod file_load;
pub mod npz;
pub mod params;
pub mod styles;

pub use cell_table::{CellTable, Cells};
pub use cell_type::{CellType, UnknownCellType};
pub use figure::{Figure, FigureOptions, RenderError, render_figure};
pub use file_load::{LoadError, load_cell_table};
pub use params::VizParams;
