//! Media storage abstraction.

use std::path::PathBuf;

use async_trait::async_trait;
use guessityet_core::types::DbId;

/// Persists rendered media and returns a stable locator for it.
///
/// Locators are relative paths like `game_gifs/game_7_1a2b3c4d.gif`;
/// what serves them is outside the pipeline's concern.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, bytes: &[u8], name: &str) -> Result<String, std::io::Error>;
}

/// Filesystem-backed store rooted at a media directory.
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, bytes: &[u8], name: &str) -> Result<String, std::io::Error> {
        let path = self.root.join(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(name, size = bytes.len(), "Stored media file");
        Ok(name.to_string())
    }
}

// ---------------------------------------------------------------------------
// Locator naming
// ---------------------------------------------------------------------------

/// Short random suffix so forced re-runs never collide with files a
/// CDN may still be caching.
fn random_suffix() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

/// Locator for a game's GIF loop.
pub fn gif_name(game_id: DbId) -> String {
    format!("game_gifs/game_{game_id}_{}.gif", random_suffix())
}

/// Locator for one zoom-processed screenshot.
pub fn screenshot_name(game_id: DbId, difficulty: i16) -> String {
    format!(
        "processed_screenshots/game_{game_id}_diff_{difficulty}_{}.jpg",
        random_suffix()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_creates_nested_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path().to_path_buf());

        let locator = store.save(b"gif bytes", "game_gifs/game_1_abc.gif").await.unwrap();
        assert_eq!(locator, "game_gifs/game_1_abc.gif");

        let written = tokio::fs::read(dir.path().join(&locator)).await.unwrap();
        assert_eq!(written, b"gif bytes");
    }

    #[test]
    fn locator_shapes() {
        let gif = gif_name(7);
        assert!(gif.starts_with("game_gifs/game_7_"));
        assert!(gif.ends_with(".gif"));

        let shot = screenshot_name(7, 3);
        assert!(shot.starts_with("processed_screenshots/game_7_diff_3_"));
        assert!(shot.ends_with(".jpg"));
    }

    #[test]
    fn suffixes_are_unique_per_call() {
        assert_ne!(gif_name(1), gif_name(1));
    }
}
