use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub fn extract_archive(archive_path: &Path, destination: &Path) -> Result<()> {
    let file = fs::File::open(archive_path)
        .with_context(|| format!("failed opening archive {}", archive_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed reading archive {}", archive_path.display()))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed reading archive entry {index}"))?;
        let Some(relative_path) = entry.enclosed_name() else {
            return Err(anyhow!(
                "archive entry '{}' escapes the extraction directory",
                entry.name()
            ));
        };
        let target = destination.join(relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("failed creating directory {}", target.display()))?;
            continue;
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed creating directory {}", parent.display()))?;
        }
        let mut output = fs::File::create(&target)
            .with_context(|| format!("failed creating file {}", target.display()))?;
        io::copy(&mut entry, &mut output)
            .with_context(|| format!("failed extracting {}", target.display()))?;
    }

    Ok(())
}

pub fn write_archive(source_root: &Path, archive_path: &Path) -> Result<u64> {
    let mut members: Vec<PathBuf> = Vec::new();
    let mut pending = vec![source_root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed scanning {} for archive members", dir.display()))?
        {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry.path());
            } else if file_type.is_file() {
                members.push(entry.path());
            }
        }
    }
    // Stable member order keeps repacked archives comparable across runs.
    members.sort();

    let file = fs::File::create(archive_path)
        .with_context(|| format!("failed creating archive {}", archive_path.display()))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut written = 0_u64;
    for source_path in members {
        let relative_path = source_path.strip_prefix(source_root).with_context(|| {
            format!(
                "archive member {} lies outside {}",
                source_path.display(),
                source_root.display()
            )
        })?;
        writer
            .start_file(normalize_entry_name(relative_path), options)
            .with_context(|| format!("failed starting archive entry {}", relative_path.display()))?;
        let mut source = fs::File::open(&source_path)
            .with_context(|| format!("failed opening {}", source_path.display()))?;
        io::copy(&mut source, &mut writer)
            .with_context(|| format!("failed compressing {}", source_path.display()))?;
        written += 1;
    }

    writer
        .finish()
        .with_context(|| format!("failed finishing archive {}", archive_path.display()))?;
    Ok(written)
}

pub fn replace_archive(new_archive: &Path, original_archive: &Path) -> Result<()> {
    fs::rename(new_archive, original_archive).with_context(|| {
        format!(
            "failed replacing {} with {}",
            original_archive.display(),
            new_archive.display()
        )
    })
}

pub fn copy_to_destination(archive_path: &Path, destination: &Path) -> Result<()> {
    fs::copy(archive_path, destination)
        .with_context(|| {
            format!(
                "failed copying {} to {}",
                archive_path.display(),
                destination.display()
            )
        })
        .map(|_| ())
}

fn normalize_entry_name(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
