//! Texture cache owned by the scene.
//!
//! Maps texture names to opaque [`TextureHandle`]s. Decoding pixels is the
//! backend's job: the cache only tracks names, sizes and which textures
//! still need uploading.
//!
//! Thread-safe so background loaders can register textures while the main
//! thread renders.

use std::collections::HashMap;

use ember_core::ecs::components::TextureHandle;
use parking_lot::RwLock;
use tracing::debug;

/// Metadata of a registered texture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureInfo {
    /// Lookup name, usually the asset path.
    pub name: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

#[derive(Default)]
struct CacheInner {
    by_name: HashMap<String, TextureHandle>,
    slots: Vec<Option<TextureInfo>>,
    pending_uploads: Vec<TextureHandle>,
}

/// Name-to-handle texture registry.
#[derive(Default)]
pub struct TextureCache {
    inner: RwLock<CacheInner>,
}

impl TextureCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a texture, or returns the handle it already has.
    pub fn register(&self, name: &str, width: u32, height: u32) -> TextureHandle {
        if let Some(&handle) = self.inner.read().by_name.get(name) {
            return handle;
        }

        let mut inner = self.inner.write();
        // Another thread may have won the race between the two locks.
        if let Some(&handle) = inner.by_name.get(name) {
            return handle;
        }
        let handle = TextureHandle(u32::try_from(inner.slots.len()).unwrap_or(u32::MAX));
        inner.slots.push(Some(TextureInfo {
            name: name.to_owned(),
            width,
            height,
        }));
        inner.by_name.insert(name.to_owned(), handle);
        inner.pending_uploads.push(handle);
        debug!(name, handle = handle.0, width, height, "texture registered");
        handle
    }

    /// Looks a texture up by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<TextureHandle> {
        self.inner.read().by_name.get(name).copied()
    }

    /// Metadata of a live texture.
    #[must_use]
    pub fn info(&self, handle: TextureHandle) -> Option<TextureInfo> {
        self.inner
            .read()
            .slots
            .get(handle.0 as usize)
            .cloned()
            .flatten()
    }

    /// Releases a texture. Its handle is never reused.
    pub fn release(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        let Some(handle) = inner.by_name.remove(name) else {
            return false;
        };
        if let Some(slot) = inner.slots.get_mut(handle.0 as usize) {
            *slot = None;
        }
        inner.pending_uploads.retain(|&pending| pending != handle);
        debug!(name, handle = handle.0, "texture released");
        true
    }

    /// Textures registered since the last call, for the backend to upload.
    pub fn take_pending_uploads(&self) -> Vec<TextureHandle> {
        std::mem::take(&mut self.inner.write().pending_uploads)
    }

    /// Number of live textures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    /// True when no texture is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Releases every texture.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let released = inner.by_name.len();
        inner.by_name.clear();
        inner.slots.iter_mut().for_each(|slot| *slot = None);
        inner.pending_uploads.clear();
        if released > 0 {
            debug!(released, "texture cache cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let cache = TextureCache::new();
        let a = cache.register("player.png", 32, 32);
        let b = cache.register("player.png", 64, 64);
        let c = cache.register("wall.png", 16, 16);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.info(a).unwrap().width, 32);
        assert_eq!(cache.take_pending_uploads(), vec![a, c]);
        assert!(cache.take_pending_uploads().is_empty());
    }

    #[test]
    fn test_release_never_reuses_handles() {
        let cache = TextureCache::new();
        let first = cache.register("a.png", 1, 1);
        assert!(cache.release("a.png"));
        assert!(!cache.release("a.png"));
        assert!(cache.info(first).is_none());
        assert!(cache.get("a.png").is_none());

        let second = cache.register("a.png", 1, 1);
        assert_ne!(first, second);
        assert!(!cache.is_empty());

        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.info(second).is_none());
    }

    #[test]
    fn test_concurrent_registration() {
        let cache = Arc::new(TextureCache::new());
        let threads: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    (0..50)
                        .map(|i| cache.register(&format!("tile_{i}.png"), 8, 8))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<Vec<TextureHandle>> =
            threads.into_iter().map(|t| t.join().unwrap()).collect();
        assert_eq!(cache.len(), 50);
        assert!(results.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
