use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde_json::Value;

use crate::labels::LabelMap;

pub const DATA_TYPE_NAME: &str = "[BlockList] Main Content";

// Textual rather than structural edit: everything outside the one
// Configuration attribute must survive byte-for-byte.
const CONFIGURATION_PATTERN: &str =
    r#"<DataType Name="\[BlockList\] Main Content"[^>]*Configuration="([^"]+)""#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentPatch {
    Rewritten {
        document: String,
        labels_added: usize,
    },
    TargetMissing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Applied { labels_added: usize },
    TargetMissing,
}

pub fn patch_document(document: &str, labels: &LabelMap) -> Result<DocumentPatch> {
    let pattern = Regex::new(CONFIGURATION_PATTERN)
        .context("failed compiling DataType configuration pattern")?;
    let Some(captures) = pattern.captures(document) else {
        return Ok(DocumentPatch::TargetMissing);
    };
    let encoded = captures
        .get(1)
        .context("configuration capture group missing")?;

    let mut config = decode_configuration(encoded.as_str())?;
    let labels_added = apply_labels(&mut config, labels);
    let reencoded = encode_configuration(&config)?;

    let mut rewritten =
        String::with_capacity(document.len() - encoded.as_str().len() + reencoded.len());
    rewritten.push_str(&document[..encoded.start()]);
    rewritten.push_str(&reencoded);
    rewritten.push_str(&document[encoded.end()..]);

    Ok(DocumentPatch::Rewritten {
        document: rewritten,
        labels_added,
    })
}

pub fn patch_package_file(package_xml_path: &Path, labels: &LabelMap) -> Result<PatchOutcome> {
    let document = fs::read_to_string(package_xml_path)
        .with_context(|| format!("failed reading {}", package_xml_path.display()))?;

    match patch_document(&document, labels)? {
        DocumentPatch::Rewritten {
            document,
            labels_added,
        } => {
            fs::write(package_xml_path, document)
                .with_context(|| format!("failed writing {}", package_xml_path.display()))?;
            Ok(PatchOutcome::Applied { labels_added })
        }
        DocumentPatch::TargetMissing => Ok(PatchOutcome::TargetMissing),
    }
}

fn decode_configuration(encoded: &str) -> Result<Value> {
    let normalized = normalize_bare_ampersands(encoded);
    let decoded = quick_xml::escape::unescape(&normalized)
        .context("failed unescaping Configuration attribute value")?;
    serde_json::from_str(&decoded).context("Configuration attribute is not valid JSON")
}

// The encoder writes label-text ampersands raw, so a previously patched
// attribute can carry `&` outside any entity reference. Promote those to
// `&amp;` so the strict entity decoder accepts the value.
fn normalize_bare_ampersands(encoded: &str) -> String {
    let mut normalized = String::with_capacity(encoded.len());
    let mut rest = encoded;
    while let Some(offset) = rest.find('&') {
        normalized.push_str(&rest[..offset]);
        if starts_entity_reference(&rest[offset..]) {
            normalized.push('&');
        } else {
            normalized.push_str("&amp;");
        }
        rest = &rest[offset + 1..];
    }
    normalized.push_str(rest);
    normalized
}

fn starts_entity_reference(text: &str) -> bool {
    let Some(tail) = text.strip_prefix('&') else {
        return false;
    };
    let Some(end) = tail.find(';') else {
        return false;
    };
    match &tail[..end] {
        "lt" | "gt" | "amp" | "quot" | "apos" => true,
        name => {
            if let Some(digits) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_hexdigit())
            } else if let Some(digits) = name.strip_prefix('#') {
                !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
            } else {
                false
            }
        }
    }
}

fn apply_labels(config: &mut Value, labels: &LabelMap) -> usize {
    let Some(blocks) = config.get_mut("blocks").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut labels_added = 0;
    for block in blocks {
        let Some(entry) = block.as_object_mut() else {
            continue;
        };
        let Some(key) = entry.get("contentElementTypeKey").and_then(Value::as_str) else {
            continue;
        };
        if let Some(label) = labels.get(key) {
            entry.insert("label".to_string(), Value::String(label.clone()));
            labels_added += 1;
        }
    }
    labels_added
}

fn encode_configuration(config: &Value) -> Result<String> {
    let compact = serde_json::to_string(config).context("failed serializing configuration")?;
    // The upstream encoder emits \u0027 for single quotes; match it so the
    // patched attribute diffs cleanly against untouched exports.
    Ok(compact.replace('\'', "\\u0027").replace('"', "&quot;"))
}
