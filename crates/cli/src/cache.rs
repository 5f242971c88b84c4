use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;

pub const DEFAULT_CACHE_FILE: &str = ".huename/labels.json";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(7 * 86_400);

/// Where resolved color names are kept between runs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelCacheConfig {
    pub path: PathBuf,
    pub ttl: Duration,
}

#[derive(Serialize, Deserialize, Debug)]
struct CacheEnvelope {
    created_ms: u64,
    api_base: String,
    entries: BTreeMap<String, String>,
}

/// Labels read back from disk, with the time they were first written.
#[derive(Debug, Default)]
pub struct StoredLabels {
    pub created_ms: Option<u64>,
    pub entries: BTreeMap<String, String>,
}

/// Read persisted labels for `api_base`.
///
/// A missing, expired, foreign or unreadable file yields no labels; only the
/// unreadable case is worth a warning.
pub async fn load_labels(cfg: &LabelCacheConfig, api_base: &str) -> StoredLabels {
    let Ok(bytes) = fs::read(&cfg.path).await else {
        return StoredLabels::default();
    };

    let envelope: CacheEnvelope = match serde_json::from_slice(&bytes) {
        Ok(val) => val,
        Err(err) => {
            log::warn!("Label cache corrupted {}: {err}", cfg.path.display());
            return StoredLabels::default();
        }
    };

    if envelope.api_base != api_base {
        log::debug!(
            "Ignoring label cache for {} (wanted {api_base})",
            envelope.api_base
        );
        return StoredLabels::default();
    }

    let age = unix_ms_now().saturating_sub(envelope.created_ms);
    let ttl_ms = u64::try_from(cfg.ttl.as_millis()).unwrap_or(u64::MAX);
    if age > ttl_ms {
        log::debug!("Label cache {} expired", cfg.path.display());
        return StoredLabels::default();
    }

    StoredLabels {
        created_ms: Some(envelope.created_ms),
        entries: envelope.entries,
    }
}

/// Write `entries` for `api_base`. `created_ms` carries over the age of a
/// cache that was loaded, so entries still expire one TTL after first fetch.
pub async fn save_labels<I>(
    cfg: &LabelCacheConfig,
    api_base: &str,
    created_ms: Option<u64>,
    entries: I,
) -> Result<()>
where
    I: IntoIterator<Item = (String, String)>,
{
    if let Some(parent) = cfg.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Cannot create cache dir {}", parent.display()))?;
    }

    let envelope = CacheEnvelope {
        created_ms: created_ms.unwrap_or_else(unix_ms_now),
        api_base: api_base.to_string(),
        entries: entries.into_iter().collect(),
    };
    let bytes = serde_json::to_vec_pretty(&envelope)?;

    let tmp = cfg.path.with_extension("json.tmp");
    fs::write(&tmp, bytes)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, &cfg.path)
        .await
        .with_context(|| format!("Failed to replace {}", cfg.path.display()))?;
    Ok(())
}

fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> LabelCacheConfig {
        LabelCacheConfig {
            path: dir.path().join("nested").join("labels.json"),
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    fn labels() -> Vec<(String, String)> {
        vec![
            ("0,100,50".to_string(), "Red".to_string()),
            ("120,100,50".to_string(), "Green".to_string()),
        ]
    }

    #[tokio::test]
    async fn saved_labels_load_back() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        save_labels(&cfg, "http://api", None, labels())
            .await
            .expect("save");

        let stored = load_labels(&cfg, "http://api").await;
        assert!(stored.created_ms.is_some());
        assert_eq!(stored.entries.into_iter().collect::<Vec<_>>(), labels());
    }

    #[tokio::test]
    async fn other_api_base_is_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        save_labels(&cfg, "http://api", None, labels())
            .await
            .expect("save");
        assert!(load_labels(&cfg, "stub").await.entries.is_empty());
    }

    #[tokio::test]
    async fn expired_cache_is_ignored() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        let old = unix_ms_now() - 8 * 86_400_000;
        save_labels(&cfg, "http://api", Some(old), labels())
            .await
            .expect("save");
        assert!(load_labels(&cfg, "http://api").await.entries.is_empty());
    }

    #[tokio::test]
    async fn corrupt_or_missing_file_yields_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let cfg = config(&dir);
        assert!(load_labels(&cfg, "http://api").await.entries.is_empty());

        std::fs::create_dir_all(cfg.path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&cfg.path, b"{ not json").expect("write");
        assert!(load_labels(&cfg, "http://api").await.entries.is_empty());
    }
}
