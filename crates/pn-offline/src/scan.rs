//! Input enumeration and output directory preparation

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::{BatchConfig, ExtensionAllowList};
use crate::error::{OfflineError, OfflineResult};
use crate::task::Task;

/// Check the input directory and make sure the output directory exists.
///
/// Returns `true` when the output directory had to be created.
pub fn prepare_directories(input_dir: &Path, output_dir: &Path) -> OfflineResult<bool> {
    if !input_dir.is_dir() {
        return Err(OfflineError::InputNotDirectory(input_dir.to_path_buf()));
    }

    match fs::metadata(output_dir) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(OfflineError::OutputNotDirectory(output_dir.to_path_buf())),
        Err(_) => {
            fs::create_dir_all(output_dir).map_err(|source| OfflineError::CreateOutputDir {
                path: output_dir.to_path_buf(),
                source,
            })?;
            Ok(true)
        }
    }
}

/// `<output_dir>/<prefix><file name>`
pub fn output_path_for(output_dir: &Path, prefix: &str, file_name: &str) -> PathBuf {
    output_dir.join(format!("{}{}", prefix, file_name))
}

/// Eligible regular files directly inside `input_dir`, sorted by name.
///
/// Symlinks and subdirectories are skipped. Nothing below the first level
/// is visited.
pub fn eligible_files(
    input_dir: &Path,
    allow_list: &ExtensionAllowList,
) -> OfflineResult<Vec<PathBuf>> {
    let walker = WalkDir::new(input_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name();

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => {
                return Err(OfflineError::ReadDir {
                    path: input_dir.to_path_buf(),
                    reason: e.to_string(),
                });
            }
            Err(e) => {
                log::warn!("skipping unreadable entry in {}: {}", input_dir.display(), e);
                continue;
            }
        };

        if !entry.file_type().is_file() {
            log::debug!("skipping non-regular entry {}", entry.path().display());
            continue;
        }
        if !allow_list.accepts(entry.path()) {
            continue;
        }

        files.push(entry.into_path());
    }

    Ok(files)
}

/// Build one task per eligible input file
pub fn collect_tasks(
    input_dir: &Path,
    output_dir: &Path,
    config: &BatchConfig,
) -> OfflineResult<Vec<Task>> {
    let files = eligible_files(input_dir, &config.allow_list())?;

    files
        .into_iter()
        .map(|input| {
            let file_name = input
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            Task::builder()
                .output(output_path_for(output_dir, &config.output_prefix, &file_name))
                .name(file_name)
                .input(input)
                .target_peak(config.target_peak)
                .build()
        })
        .collect()
}
