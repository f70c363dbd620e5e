#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

pub fn npy(descr: &str, shape: &str, body: &[u8]) -> Vec<u8> {
    let mut header = format!("{{'descr': '{descr}', 'fortran_order': False, 'shape': {shape}, }}");
    while (10 + header.len() + 1) % 64 != 0 {
        header.push(' ');
    }
    header.push('\n');
    let mut out = b"\x93NUMPY\x01\x00".to_vec();
    out.extend_from_slice(&(header.len() as u16).to_le_bytes());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(body);
    out
}

pub fn npy_f64(values: &[f64]) -> Vec<u8> {
    let body: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();
    npy("<f8", &format!("({},)", values.len()), &body)
}

pub fn npy_unicode(values: &[&str]) -> Vec<u8> {
    let width = values.iter().map(|v| v.chars().count()).max().unwrap_or(1).max(1);
    let mut body = Vec::new();
    for value in values {
        let mut chars: Vec<u32> = value.chars().map(|c| c as u32).collect();
        chars.resize(width, 0);
        body.extend(chars.iter().flat_map(|c| c.to_le_bytes()));
    }
    npy(&format!("<U{width}"), &format!("({},)", values.len()), &body)
}

pub fn npy_rgb_rows(rows: &[[f64; 3]]) -> Vec<u8> {
    let body: Vec<u8> = rows.iter().flatten().flat_map(|v| v.to_le_bytes()).collect();
    npy("<f8", &format!("({}, 3)", rows.len()), &body)
}

/// The four-cell bundle: one cell of each type, one of them above a
/// threshold of 3.
pub fn sample_members() -> Vec<(&'static str, Vec<u8>)> {
    vec![
        ("x", npy_f64(&[0.0, 1.5, 3.0, 4.5])),
        ("y", npy_f64(&[2.0, -1.0, 0.5, 3.5])),
        (
            "cell_types",
            npy_unicode(&["t_cells", "b_cells", "monocytes", "nk_cells"]),
        ),
        ("gene1", npy_f64(&[1.0, 4.0, 5.0, 2.0])),
        ("gene2", npy_f64(&[1.0, 5.0, 2.0, 6.0])),
        (
            "colors",
            npy_unicode(&["#e74c3c", "#3498db", "#2ecc71", "#f39c12"]),
        ),
    ]
}

pub fn write_npz(path: &Path, members: &[(&str, Vec<u8>)]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, bytes) in members {
        writer.start_file(format!("{name}.npy"), options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap();
}

/// A temporary directory holding `single_cell_data.npz`.
pub struct Fixture {
    _dir: TempDir,
    pub data: PathBuf,
    pub output: PathBuf,
}

impl Fixture {
    pub fn new(members: &[(&str, Vec<u8>)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("single_cell_data.npz");
        let output = dir.path().join("single_cell_viz.png");
        write_npz(&data, members);
        Self {
            _dir: dir,
            data,
            output,
        }
    }

    pub fn sample() -> Self {
        Self::new(&sample_members())
    }
}
