use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "png" | "webp" | "gif" | "bmp" | "tiff" | "tif" => Some(Self::Image),
            "webm" | "mp4" | "mkv" | "avi" | "mov" => Some(Self::Video),
            _ => None,
        }
    }

    /// Kind for an identity string (a relative file path), by its extension.
    pub fn from_identity(identity: &str) -> Option<Self> {
        let (_, ext) = identity.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

/// One entry of the media collection, as parsed from the metadata feed.
///
/// `identity` is the stable join key used everywhere (reverse index, flat
/// sequence, selection, widget addressing). `index` is the chronological
/// rank assigned after the feed is sorted by timestamp.
#[derive(Debug, Clone)]
pub struct MediaItem {
    pub index: usize,
    pub timestamp_ms: i64,
    pub identity: String,
    pub kind: MediaKind,
    pub width: u32,
    pub height: u32,
    pub tags: BTreeSet<String>,
}

impl MediaItem {
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Check if this is a video file based on media kind
    pub fn is_video(&self) -> bool {
        self.kind == MediaKind::Video
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(MediaKind::from_extension("JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::from_extension("mov"), Some(MediaKind::Video));
        assert_eq!(MediaKind::from_extension("txt"), None);
    }

    #[test]
    fn test_kind_from_identity() {
        assert_eq!(
            MediaKind::from_identity("2019/beach/IMG_0042.jpeg"),
            Some(MediaKind::Image)
        );
        assert_eq!(
            MediaKind::from_identity("clips/pan.mp4"),
            Some(MediaKind::Video)
        );
        assert_eq!(MediaKind::from_identity("no-extension"), None);
        assert_eq!(MediaKind::from_identity("meta.txt"), None);
    }

    #[test]
    fn test_aspect_ratio_zero_height() {
        let item = MediaItem {
            index: 0,
            timestamp_ms: 0,
            identity: "broken.jpg".into(),
            kind: MediaKind::Image,
            width: 1920,
            height: 0,
            tags: BTreeSet::new(),
        };
        assert_eq!(item.aspect_ratio(), 1.0);
    }
}
