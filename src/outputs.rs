use anyhow::{anyhow, Context};
use std::path::{Path, PathBuf};

const PLAN_EXTENSION: &str = "txt";
const DEFAULT_TITLE: &str = "plan";

/// `{title}_{date}.txt`, keeping letters (diacritics included), digits, `-`
/// and `_`; whitespace becomes `_`.
pub fn plan_file_name(title: &str, date: &str) -> String {
    let clean = |raw: &str| -> String {
        raw.trim()
            .chars()
            .filter_map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    Some(c)
                } else if c.is_whitespace() {
                    Some('_')
                } else {
                    None
                }
            })
            .collect()
    };
    let mut title = clean(title);
    if title.is_empty() {
        title = DEFAULT_TITLE.to_string();
    }
    let date = clean(date);
    if date.is_empty() {
        format!("{title}.{PLAN_EXTENSION}")
    } else {
        format!("{title}_{date}.{PLAN_EXTENSION}")
    }
}

pub fn save_plan(dir: &Path, title: &str, date: &str, content: &str) -> anyhow::Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.to_string_lossy()))?;
    let path = dir.join(plan_file_name(title, date));
    std::fs::write(&path, content)
        .with_context(|| format!("failed to write plan {}", path.to_string_lossy()))?;
    log::info!("saved plan to {}", path.to_string_lossy());
    Ok(path)
}

/// File names of saved plans, sorted.
pub fn list_plans(dir: &Path) -> anyhow::Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for ent in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.to_string_lossy()))?
    {
        let p = ent?.path();
        if !p.is_file() {
            continue;
        }
        if p.extension().and_then(|e| e.to_str()) != Some(PLAN_EXTENSION) {
            continue;
        }
        if let Some(name) = p.file_name().and_then(|s| s.to_str()) {
            names.push(name.to_string());
        }
    }
    names.sort();
    Ok(names)
}

/// Reads a saved plan by bare file name; paths are rejected.
pub fn load_plan(dir: &Path, name: &str) -> anyhow::Result<String> {
    let name = name.trim();
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name == "."
        || name == ".."
    {
        return Err(anyhow!("invalid plan file name: {name:?}"));
    }
    let path = dir.join(name);
    std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read plan {}", path.to_string_lossy()))
}
