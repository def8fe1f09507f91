use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use minijinja::{Environment, Error, State};
use sha2::{Digest, Sha256};

/// Resolves `{{ asset("style.css") }}` to a URL under `/static` carrying a
/// content hash, so browsers refetch a file only after it changes.
#[derive(Debug, Clone)]
pub struct AssetLoader {
    root: PathBuf,
    cache: Arc<RwLock<HashMap<String, String>>>,
}

impl AssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::default(),
        }
    }

    pub fn asset_path(&self, path: &str) -> String {
        if let Some(hashed) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return hashed.clone();
        }

        // Missing files are not cached so they pick up a hash once they exist.
        let Ok(contents) = fs::read(self.root.join(path)) else {
            return format!("/static/{path}");
        };

        let hash = Sha256::digest(&contents);
        let hashed = format!("/static/{path}?v={:x}", hash);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_string(), hashed.clone());
        hashed
    }

    pub fn register(&self, env: &mut Environment<'_>) {
        let loader = self.clone();
        env.add_function(
            "asset",
            move |_state: &State, path: String| -> Result<String, Error> {
                Ok(loader.asset_path(&path))
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_existing_files() {
        let loader = AssetLoader::new("static");
        let path = loader.asset_path("style.css");
        assert!(path.starts_with("/static/style.css?v="));
        // Cached value is stable.
        assert_eq!(loader.asset_path("style.css"), path);
    }

    #[test]
    fn missing_files_fall_back_to_plain_path() {
        let loader = AssetLoader::new("static");
        assert_eq!(loader.asset_path("nope.js"), "/static/nope.js");
    }
}
