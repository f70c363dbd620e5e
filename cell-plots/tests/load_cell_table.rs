mod common;

use std::path::Path;

use cell_plots::npz::NpyError;
use cell_plots::{CellTable, CellType, LoadError, load_cell_table};
use common::{Fixture, npy, npy_f64, npy_rgb_rows, npy_unicode, sample_members};

#[test]
fn loads_the_sample_bundle() {
    let fixture = Fixture::sample();
    let table = load_cell_table(&fixture.data).unwrap();
    assert_eq!(table.len(), 4);

    let cells = table.cells().unwrap();
    assert_eq!(cells.x, vec![0.0, 1.5, 3.0, 4.5]);
    assert_eq!(cells.cell_types[3], "nk_cells");
    assert_eq!(cells.colors[0], "#e74c3c");
    assert_eq!(cells.count_above_threshold(3.0), 1);
    assert_eq!(
        cells.highlight_mask(CellType::Monocytes),
        vec![false, false, true, false]
    );
}

#[test]
fn missing_file_is_reported_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single_cell_data.npz");
    let err = CellTable::load(&path).unwrap_err();
    assert!(matches!(err, LoadError::NotFound { .. }));
    assert_eq!(
        err.to_string(),
        format!("File '{}' not found!", path.display())
    );
}

#[test]
fn unequal_lengths_are_rejected() {
    let mut members = sample_members();
    members[3] = ("gene1", npy_f64(&[1.0, 4.0, 5.0]));
    let fixture = Fixture::new(&members);

    let err = load_cell_table(&fixture.data).unwrap_err();
    assert!(matches!(
        err,
        LoadError::LengthMismatch {
            name: "gene1",
            expected: 4,
            found: 3
        }
    ));
}

#[test]
fn missing_array_names_the_key() {
    let members: Vec<_> = sample_members()
        .into_iter()
        .filter(|(name, _)| *name != "gene2")
        .collect();
    let fixture = Fixture::new(&members);

    let err = load_cell_table(&fixture.data).unwrap_err();
    assert!(matches!(err, LoadError::Npz(NpyError::MissingKey(ref key)) if key == "gene2"));
    assert!(err.to_string().contains("gene2"));
}

#[test]
fn numeric_color_rows_become_hex() {
    let mut members = sample_members();
    members[5] = (
        "colors",
        npy_rgb_rows(&[
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 0.5, 0.0],
            [1.0, 1.0, 1.0],
        ]),
    );
    let fixture = Fixture::new(&members);

    let cells = load_cell_table(&fixture.data).unwrap().cells().unwrap();
    assert_eq!(cells.colors, vec!["#ff0000", "#0000ff", "#008000", "#ffffff"]);
}

#[test]
fn named_colors_are_normalised() {
    let mut members = sample_members();
    members[5] = ("colors", npy_unicode(&["red", "tab:blue", "#abc", "gold"]));
    let fixture = Fixture::new(&members);

    let cells = load_cell_table(&fixture.data).unwrap().cells().unwrap();
    assert_eq!(cells.colors, vec!["#ff0000", "#1f77b4", "#aabbcc", "#ffd700"]);
}

#[test]
fn unknown_labels_load_but_never_match() {
    let mut members = sample_members();
    members[2] = (
        "cell_types",
        npy_unicode(&["t_cells", "dendritic", "t_cells", "mystery"]),
    );
    let fixture = Fixture::new(&members);

    let cells = load_cell_table(&fixture.data).unwrap().cells().unwrap();
    assert_eq!(
        cells.highlight_mask(CellType::NkCells),
        vec![false, false, false, false]
    );
    assert_eq!(
        cells.highlight_mask(CellType::TCells),
        vec![true, false, true, false]
    );
}

#[test]
fn text_in_a_numeric_column_is_a_kind_error() {
    let mut members = sample_members();
    members[0] = ("x", npy_unicode(&["a", "b", "c", "d"]));
    let fixture = Fixture::new(&members);

    let err = load_cell_table(&fixture.data).unwrap_err();
    assert!(matches!(err, LoadError::WrongKind { name: "x", .. }));
}

#[test]
fn not_a_zip_archive() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.npz");
    std::fs::write(&path, b"definitely not a zip file").unwrap();

    let err = load_cell_table(Path::new(&path)).unwrap_err();
    assert!(matches!(err, LoadError::Npz(NpyError::Archive(_))));
}

#[test]
fn corrupt_color_shape_fails_the_load() {
    let mut members = sample_members();
    members[5] = ("colors", npy("<f8", "(2305843009213693952, 8)", &[]));
    let fixture = Fixture::new(&members);

    let err = load_cell_table(&fixture.data).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Npz(NpyError::Entry { ref name, .. }) if name == "colors"
    ));
}

#[test]
fn color_rows_that_disagree_with_the_data_are_a_shape_error() {
    let mut members = sample_members();
    let body: Vec<u8> = [1.0f64; 6].iter().flat_map(|v| v.to_le_bytes()).collect();
    members[5] = ("colors", npy("<f8", "(4, 0)", &body));
    let fixture = Fixture::new(&members);

    let err = load_cell_table(&fixture.data).unwrap_err();
    assert!(matches!(err, LoadError::Shape { name: "colors", .. }));
}
