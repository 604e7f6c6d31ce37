//! Source files for CLI integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

/// Unit quad in the XY plane with UVs and normals (2 triangles)
pub fn generate_quad_obj(path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "# Test quad")?;
    writeln!(file, "o Quad")?;
    for v in ["0 0 0", "1 0 0", "1 1 0", "0 1 0"] {
        writeln!(file, "v {v}")?;
    }
    for vt in ["0 0", "1 0", "1 1", "0 1"] {
        writeln!(file, "vt {vt}")?;
    }
    writeln!(file, "vn 0 0 1")?;
    writeln!(file, "f 1/1/1 2/2/1 3/3/1 4/4/1")?;
    Ok(())
}

/// Unit cube with positions only (6 quads, 12 triangles)
pub fn generate_cube_obj(path: &Path) -> std::io::Result<()> {
    let mut file = std::fs::File::create(path)?;
    writeln!(file, "# Test cube")?;
    for z in [0, 1] {
        for y in [0, 1] {
            for x in [0, 1] {
                writeln!(file, "v {x} {y} {z}")?;
            }
        }
    }
    for face in [
        "1 3 4 2", "5 6 8 7", "1 2 6 5", "3 7 8 4", "1 5 7 3", "2 4 8 6",
    ] {
        writeln!(file, "f {face}")?;
    }
    Ok(())
}

/// Write a manifest next to its sources
pub fn write_manifest(dir: &Path, contents: &str) -> std::io::Result<std::path::PathBuf> {
    let path = dir.join("vulpes.toml");
    std::fs::write(&path, contents)?;
    Ok(path)
}
