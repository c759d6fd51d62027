use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppError;

fn resource_error(path: &Path, err: io::Error) -> AppError {
    AppError::Resource(format!("{}: {}", path.display(), err))
}

/// Relative paths of every `.png` under `root`, sorted.
fn collect_pngs(root: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).map_err(|e| resource_error(&dir, e))? {
            let path = entry.map_err(|e| resource_error(&dir, e))?.path();
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("png")) {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
        }
    }

    found.sort();
    Ok(found)
}

/// Zips every rendered chart in the plot store into an in-memory archive.
pub fn build_archive(root: &Path) -> Result<Vec<u8>, AppError> {
    let files = collect_pngs(root)?;
    tracing::info!("Archiving {} plots from {}", files.len(), root.display());

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for relative in files {
        // zip entry names always use forward slashes
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let path = root.join(&relative);

        writer.start_file(name, options)?;
        let mut file = File::open(&path).map_err(|e| resource_error(&path, e))?;
        io::copy(&mut file, &mut writer).map_err(|e| resource_error(&path, e))?;
    }

    Ok(writer.finish()?.into_inner())
}
