use crate::transform::*;

/// The category of a raw snapshot: the name of the directory it is in.
pub fn category_of(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_stem())
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Writes pretty-printed json, replacing the file in one step.
///
/// The content is first written next to the destination, then renamed over it.
pub fn write_json(js: &JSValue, path: &Path) -> TResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context(WritingJsonSnafu {
            path: dir.display().to_string(),
        })?;
    }
    let mut contents = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {})?;
    contents.push('\n');

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);
    fs::write(&tmp_path, contents).context(WritingJsonSnafu {
        path: tmp_path.display().to_string(),
    })?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        if let Err(e2) = fs::remove_file(&tmp_path) {
            warn!("write_json: could not remove {}: {}", tmp_path.display(), e2);
        }
        return Err(e).context(WritingJsonSnafu {
            path: path.display().to_string(),
        });
    }
    debug!("write_json: wrote {}", path.display());
    Ok(())
}
