//! Dump command: print the contents of a backing file.

use std::path::Path;

use anyhow::Context;
use livevar::Document;
use serde_json::Value;

pub fn run_dump(path: &Path) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    let doc = Document::parse(&text).with_context(|| format!("cannot parse {}", path.display()))?;

    print!("{}", render_document(&doc)?);
    Ok(())
}

fn render_document(doc: &Document) -> anyhow::Result<String> {
    let mut out = String::new();
    if let Some(version) = doc.version()? {
        out.push_str(&format!("version = {version}\n"));
    }

    for group in doc.groups() {
        out.push_str(&format!("\n[{}]\n", group.name()));
        for (name, node) in group.items() {
            out.push_str(&format!("  {name} = {}\n", render_node(node)));
        }
    }
    Ok(out)
}

fn render_node(node: &Value) -> String {
    match node {
        Value::String(text) => text.clone(),
        Value::Object(fields) => {
            let parts: Vec<String> = fields
                .iter()
                .map(|(key, value)| format!("{key}: {}", render_node(value)))
                .collect();
            format!("{{ {} }}", parts.join(", "))
        }
        other => other.to_string(),
    }
}
