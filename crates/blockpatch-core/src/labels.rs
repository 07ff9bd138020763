use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;

pub type LabelMap = BTreeMap<String, String>;

#[derive(Debug, Deserialize)]
struct LabelSourceConfig {
    #[serde(default)]
    blocks: Vec<BlockDefinition>,
}

#[derive(Debug, Deserialize)]
struct BlockDefinition {
    #[serde(rename = "contentElementTypeKey", default)]
    content_element_type_key: Option<String>,
    #[serde(default)]
    label: Option<String>,
}

pub fn strip_markdown_bold(text: &str) -> String {
    text.replace("**", "")
}

pub fn extract_labels(source_path: &Path) -> Result<LabelMap> {
    let document = fs::read_to_string(source_path).with_context(|| {
        format!(
            "failed reading label source file {}",
            source_path.display()
        )
    })?;
    parse_label_source(&document).with_context(|| {
        format!(
            "failed extracting labels from {}",
            source_path.display()
        )
    })
}

pub fn parse_label_source(document: &str) -> Result<LabelMap> {
    let raw_config = find_config_text(document)?
        .ok_or_else(|| anyhow::anyhow!("label source has no Config element"))?;

    let config: LabelSourceConfig = serde_json::from_str(raw_config.trim())
        .context("Config element does not contain valid JSON")?;

    let mut labels = LabelMap::new();
    for block in config.blocks {
        let Some(key) = block.content_element_type_key.filter(|key| !key.is_empty()) else {
            continue;
        };
        let Some(label) = block.label.filter(|label| !label.is_empty()) else {
            continue;
        };
        labels.insert(key, strip_markdown_bold(&label));
    }

    Ok(labels)
}

fn find_config_text(document: &str) -> Result<Option<String>> {
    let mut reader = Reader::from_str(document);
    let mut inside_config = 0_usize;
    let mut text = String::new();

    loop {
        let event = reader
            .read_event()
            .context("failed parsing label source XML")?;
        match event {
            Event::Start(start) => {
                if inside_config > 0 {
                    inside_config += 1;
                } else if start.local_name().as_ref() == b"Config" {
                    inside_config = 1;
                }
            }
            Event::Empty(start)
                if inside_config == 0 && start.local_name().as_ref() == b"Config" =>
            {
                return Ok(Some(String::new()));
            }
            Event::End(_) if inside_config > 0 => {
                inside_config -= 1;
                if inside_config == 0 {
                    return Ok(Some(text));
                }
            }
            Event::Text(chunk) if inside_config > 0 => {
                let unescaped = chunk
                    .unescape()
                    .context("failed unescaping Config element text")?;
                text.push_str(&unescaped);
            }
            Event::CData(chunk) if inside_config > 0 => {
                text.push_str(&String::from_utf8_lossy(chunk.as_ref()));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
    }
}
