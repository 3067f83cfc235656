use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::ValueEnum;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};

use crate::api::TaskApi;
use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Pending,
    Done,
    All,
}

impl ExportKind {
    pub fn path(self) -> &'static str {
        match self {
            ExportKind::Pending => "/export/pending",
            ExportKind::Done => "/export/done",
            ExportKind::All => "/export/all",
        }
    }

    pub fn default_filename(self) -> &'static str {
        match self {
            ExportKind::Pending => "pending_tasks.xlsx",
            ExportKind::Done => "done_tasks.xlsx",
            ExportKind::All => "all_tasks.xlsx",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPayload {
    pub disposition: Option<String>,
    pub bytes: Vec<u8>,
}

fn disposition_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\*=UTF-8''([^;\s]+)|filename="?([^";]+)"?"#)
            .map_err(|err| warn!(error = %err, "content-disposition pattern failed to compile"))
            .ok()
    })
    .as_ref()
}

/// Suggested filename from a `Content-Disposition` value. The first
/// `filename` directive in the header wins, whichever form it takes.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let caps = disposition_re()?.captures(header)?;

    if let Some(encoded) = caps.get(1) {
        let raw = encoded.as_str();
        return Some(
            percent_decode_str(raw)
                .decode_utf8()
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| raw.to_string()),
        );
    }

    caps.get(2)
        .map(|plain| plain.as_str().trim().to_string())
        .filter(|name| !name.is_empty())
}

/// Last path component only; `None` for names that cannot be a file.
fn sanitize_filename(name: &str) -> Option<String> {
    let last = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match last {
        "" | "." | ".." => None,
        other => Some(other.to_string()),
    }
}

pub fn resolve_filename(kind: ExportKind, disposition: Option<&str>) -> String {
    disposition
        .and_then(filename_from_disposition)
        .and_then(|name| sanitize_filename(&name))
        .unwrap_or_else(|| kind.default_filename().to_string())
}

/// First free path for `name` in `dir`: `name`, then `stem (1).ext`, ...
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    (1u32..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{stem} ({n}).{ext}")),
            None => dir.join(format!("{stem} ({n})")),
        })
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}

#[instrument(skip(api, dir), fields(dir = %dir.display()))]
pub async fn export_view<A: TaskApi>(
    api: &A,
    kind: ExportKind,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let payload = api.export(kind).await?;
    let filename = resolve_filename(kind, payload.disposition.as_deref());
    debug!(filename = %filename, bytes = payload.bytes.len(), "resolved export filename");

    let path = save_payload(dir, &filename, &payload.bytes)?;
    info!(path = %path.display(), kind = ?kind, "export saved");
    Ok(path)
}

fn save_payload(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    let save_err = |path: &Path, source: std::io::Error| ExportError::Save {
        path: path.to_path_buf(),
        source,
    };

    fs::create_dir_all(dir).map_err(|err| save_err(dir, err))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|err| save_err(dir, err))?;
    temp.write_all(bytes)
        .and_then(|_| temp.flush())
        .map_err(|err| save_err(temp.path(), err))?;

    let path = unique_path(dir, filename);
    temp.persist_noclobber(&path)
        .map_err(|err| save_err(&path, err.error))?;
    Ok(path)
}
