use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use blockpatch_core::{extract_labels, patch_package_file, PatchOutcome, DATA_TYPE_NAME};
use blockpatch_package::{
    copy_to_destination, extract_archive, replace_archive, write_archive, ScratchDir,
};

use crate::layout::ProjectLayout;
use crate::render::{print_status, OutputStyle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Completed {
        labels_added: usize,
        deployed: PathBuf,
    },
    TargetMissing,
}

pub fn validate_inputs(archive_path: &Path, layout: &ProjectLayout) -> Result<()> {
    if !archive_path.exists() {
        return Err(anyhow!(
            "package archive not found at {}\n\n\
             usage:\n  blockpatch [path/to/package.zip]\n\n\
             default archive location: {}\n\
             download the export package there, or pass its path as an argument",
            archive_path.display(),
            layout.default_archive_path().display()
        ));
    }
    let label_source = layout.label_source_path();
    if !label_source.exists() {
        return Err(anyhow!(
            "label source config not found at {}",
            label_source.display()
        ));
    }
    let migrations_dir = layout.migrations_dir();
    if !migrations_dir.exists() {
        return Err(anyhow!(
            "migrations directory not found at {}",
            migrations_dir.display()
        ));
    }
    Ok(())
}

pub fn run_fix_package(
    archive_path: &Path,
    layout: &ProjectLayout,
    style: OutputStyle,
) -> Result<PipelineOutcome> {
    let scratch_parent = archive_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let scratch = ScratchDir::create(&scratch_parent)?;

    print_status(
        style,
        "step",
        &format!("extracting {}", archive_path.display()),
    );
    extract_archive(archive_path, scratch.path())?;

    let label_source = layout.label_source_path();
    print_status(
        style,
        "step",
        &format!("reading labels from {}", label_source.display()),
    );
    let labels = extract_labels(&label_source)?;
    print_status(style, "step", &format!("found {} block labels", labels.len()));

    let package_xml = scratch.path().join("package.xml");
    if !package_xml.exists() {
        return Err(anyhow!(
            "package.xml not found in {}",
            archive_path.display()
        ));
    }

    print_status(style, "step", "modifying package.xml");
    let labels_added = match patch_package_file(&package_xml, &labels)? {
        PatchOutcome::Applied { labels_added } => labels_added,
        PatchOutcome::TargetMissing => {
            print_status(
                style,
                "warn",
                &format!("could not find DataType '{DATA_TYPE_NAME}' in package.xml"),
            );
            return Ok(PipelineOutcome::TargetMissing);
        }
    };
    print_status(
        style,
        "step",
        &format!("added {labels_added} labels to '{DATA_TYPE_NAME}'"),
    );

    print_status(style, "step", "repacking archive");
    let repacked = repack_path(archive_path);
    write_archive(scratch.path(), &repacked)?;
    replace_archive(&repacked, archive_path)?;

    let deployed = layout.deployed_archive_path();
    print_status(
        style,
        "step",
        &format!("copying to {}", deployed.display()),
    );
    copy_to_destination(archive_path, &deployed)?;

    print_status(
        style,
        "ok",
        &format!(
            "patched {} labels and deployed to {}",
            labels_added,
            deployed.display()
        ),
    );

    Ok(PipelineOutcome::Completed {
        labels_added,
        deployed,
    })
}

fn repack_path(archive_path: &Path) -> PathBuf {
    let file_name = archive_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "package.zip".to_string());
    archive_path.with_file_name(format!("{file_name}.new"))
}
