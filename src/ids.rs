use std::collections::BTreeSet;
use std::fs;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use tracing::warn;

use crate::domain::PhamId;
use crate::error::VerifyError;
use crate::store::Store;

static LISTING_HREF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href=['"](\d+)\.json['"]"#).expect("listing href regex is valid")
});

/// Read the ID list: one id per line, blanks and `#` comments ignored.
/// The result is deduplicated and ascending.
pub fn load_ids(path: &Utf8Path) -> Result<Vec<PhamId>, VerifyError> {
    if !path.as_std_path().exists() {
        return Err(VerifyError::MissingIdList(path.as_std_path().to_path_buf()));
    }
    let content = fs::read_to_string(path.as_std_path())
        .map_err(|err| VerifyError::Filesystem(format!("read {path}: {err}")))?;
    Ok(parse_ids(&content, path.as_str()))
}

pub fn parse_ids(content: &str, origin: &str) -> Vec<PhamId> {
    let mut ids = BTreeSet::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<PhamId>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => warn!(line, origin, "ignoring invalid line in pham id list"),
        }
    }
    ids.into_iter().collect()
}

/// Returns `false` without touching the file when `ids` is empty.
pub fn write_ids(path: &Utf8Path, ids: &[PhamId]) -> Result<bool, VerifyError> {
    if ids.is_empty() {
        warn!(%path, "no pham ids to write; leaving list untouched");
        return Ok(false);
    }
    let mut content = ids
        .iter()
        .map(PhamId::to_string)
        .collect::<Vec<_>>()
        .join("\n");
    content.push('\n');
    Store::write_bytes_atomic(path, content.as_bytes())?;
    Ok(true)
}

/// Pham ids linked from a directory listing page as `<id>.json`.
pub fn extract_listing_ids(html: &str) -> Vec<PhamId> {
    LISTING_HREF
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .filter_map(|m| m.as_str().parse::<PhamId>().ok())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
