mod labels;
mod patch;

pub use labels::{extract_labels, parse_label_source, strip_markdown_bold, LabelMap};
pub use patch::{patch_document, patch_package_file, DocumentPatch, PatchOutcome, DATA_TYPE_NAME};
