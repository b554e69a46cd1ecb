//! Preview handles for selected-but-not-yet-submitted files
//!
//! The browser original created an object URL per selected file and had to
//! revoke it on every removal path. The same contract holds here: one
//! handle per candidate, released exactly once.

use base64::Engine;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Opaque handle on one allocated preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewHandle(pub u64);

/// Displayable-preview capability
pub trait ImagePreviews: Send + Sync {
    /// Allocates a preview for one candidate file
    fn create(&self, file_name: &str, bytes: &[u8]) -> PreviewHandle;

    /// Releases a preview. Releasing an unknown handle is a no-op.
    fn release(&self, handle: PreviewHandle);
}

/// Simple MIME guess from the filename extension
fn guess_mime(file_name: &str) -> &'static str {
    match file_name
        .rsplit('.')
        .next()
        .map(|s| s.to_ascii_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("heic") | Some("heif") => "image/heic",
        _ => "image/jpeg",
    }
}

/// Previews as base64 data URLs, usable by any embedded web view
#[derive(Default)]
pub struct DataUrlPreviews {
    next_id: AtomicU64,
    urls: Mutex<HashMap<u64, String>>,
}

impl DataUrlPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the data URL behind a live handle
    pub fn url(&self, handle: PreviewHandle) -> Option<String> {
        self.urls.lock().unwrap().get(&handle.0).cloned()
    }

    /// Number of currently live previews
    pub fn live_count(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

impl ImagePreviews for DataUrlPreviews {
    fn create(&self, file_name: &str, bytes: &[u8]) -> PreviewHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let url = format!(
            "data:{};base64,{}",
            guess_mime(file_name),
            base64::engine::general_purpose::STANDARD.encode(bytes)
        );
        self.urls.lock().unwrap().insert(id, url);
        PreviewHandle(id)
    }

    fn release(&self, handle: PreviewHandle) {
        if self.urls.lock().unwrap().remove(&handle.0).is_none() {
            log::warn!("Released unknown preview handle {:?}", handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_release() {
        let previews = DataUrlPreviews::new();
        let handle = previews.create("shirt.png", &[1, 2, 3]);

        assert_eq!(previews.live_count(), 1);
        let url = previews.url(handle).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));

        previews.release(handle);
        assert_eq!(previews.live_count(), 0);
        assert_eq!(previews.url(handle), None);
    }

    #[test]
    fn test_mime_guess_defaults_to_jpeg() {
        assert_eq!(guess_mime("photo.HEIC"), "image/heic");
        assert_eq!(guess_mime("photo"), "image/jpeg");
        assert_eq!(guess_mime("archive.zip"), "image/jpeg");
    }

    #[test]
    fn test_double_release_is_harmless() {
        let previews = DataUrlPreviews::new();
        let handle = previews.create("a.jpg", &[0]);
        previews.release(handle);
        previews.release(handle);
        assert_eq!(previews.live_count(), 0);
    }
}
