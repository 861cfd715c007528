use std::collections::HashSet;
use std::path::{Path, PathBuf};

const ROM_EXTS: [&str; 2] = ["zip", "7z"];

/// Collects the rom ids (archive file stems) found anywhere under `root`.
pub fn scan_roms(root: &Path) -> HashSet<String> {
    let mut found = HashSet::new();

    let mut stack: Vec<PathBuf> = vec![root.to_path_buf()];
    while let Some(cur) = stack.pop() {
        let entries = match cur.read_dir() {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("scan: cannot read {}: {}", cur.display(), e);
                continue;
            }
        };
        for e in entries.flatten() {
            let p = e.path();
            match e.file_type() {
                Ok(ft) if ft.is_dir() => stack.push(p),
                Ok(ft) if ft.is_file() => {
                    if let Some(rom) = rom_id(&p) {
                        found.insert(rom);
                    }
                }
                _ => {}
            }
        }
    }

    log::debug!("scan: {} roms under {}", found.len(), root.display());
    found
}

fn rom_id(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !ROM_EXTS.contains(&ext.as_str()) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}
