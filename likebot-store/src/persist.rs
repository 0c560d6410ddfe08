use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

/// Serialize `value` as pretty JSON and replace `path` with it.
///
/// The payload is written to a sibling `<path>.tmp`, flushed to disk, then
/// renamed over `path`, so readers only ever observe the old document or the
/// complete new one.
pub async fn write_json_atomic<T>(path: &Path, value: &T) -> anyhow::Result<()>
where
    T: Serialize,
{
    let payload = serde_json::to_vec_pretty(value)
        .with_context(|| format!("failed to serialize `{}`", path.display()))?;

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory `{}`", parent.display()))?;
    }

    let tmp_path = temp_path_for(path);
    let mut file = tokio::fs::File::create(&tmp_path)
        .await
        .with_context(|| format!("failed to create `{}`", tmp_path.display()))?;
    file.write_all(&payload)
        .await
        .with_context(|| format!("failed to write `{}`", tmp_path.display()))?;
    file.sync_all()
        .await
        .with_context(|| format!("failed to sync `{}`", tmp_path.display()))?;
    drop(file);

    tokio::fs::rename(&tmp_path, path).await.with_context(|| {
        format!(
            "failed to move `{}` over `{}`",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(())
}

/// Sibling path used as the staging file for [`write_json_atomic`].
pub fn temp_path_for(path: &Path) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".tmp");
    PathBuf::from(raw)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::Path;

    use super::{temp_path_for, write_json_atomic};

    #[test]
    fn temp_path_is_a_sibling() {
        assert_eq!(
            temp_path_for(Path::new("data/like_channels.json")),
            Path::new("data/like_channels.json.tmp")
        );
    }

    #[tokio::test]
    async fn replaces_existing_document_and_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        std::fs::write(&path, "{\"old\": true}").unwrap();

        let mut value = BTreeMap::new();
        value.insert("new", 1);
        write_json_atomic(&path, &value).await.unwrap();

        let written: BTreeMap<String, i32> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.get("new"), Some(&1));
        assert!(!temp_path_for(&path).exists());
    }

    #[tokio::test]
    async fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("doc.json");

        write_json_atomic(&path, &Vec::<u8>::new()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
