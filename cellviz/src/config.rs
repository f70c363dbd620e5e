//! Fixed locations. The tool takes no configuration beyond its three
//! positional arguments.

/// Bundle produced by the data generator.
pub const DATA_PATH: &str = "/data/experiment/single_cell_data.npz";

/// Overwritten on every successful run.
pub const OUTPUT_PATH: &str = "/results/single_cell_viz.png";

pub const GENERATE_HINT: &str = "Please generate data first using: python generate_data.py";
