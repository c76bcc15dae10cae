use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod youtube;

pub use youtube::YtDlpLister;

/// One video to fetch captions for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    id: String,
    title: String,
    source_label: String,
    view_count: u64,
    duration: u64,
    url: String,
}

impl Item {
    /// Create an item; the watch URL is derived from the id
    pub fn new(id: impl Into<String>, title: impl Into<String>, source_label: impl Into<String>) -> Self {
        let id = id.into();
        let url = watch_url(&id);
        Self {
            id,
            title: title.into(),
            source_label: source_label.into(),
            view_count: 0,
            duration: 0,
            url,
        }
    }

    /// Attach listing metadata (view count, duration in seconds)
    pub fn with_stats(self, view_count: u64, duration: u64) -> Self {
        Self {
            view_count,
            duration,
            ..self
        }
    }

    /// Use an explicit URL instead of the derived watch URL
    pub fn with_url(self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..self
        }
    }

    /// Re-tag the item with a grouping label
    pub fn with_source_label(self, source_label: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            ..self
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_label(&self) -> &str {
        &self.source_label
    }

    pub fn view_count(&self) -> u64 {
        self.view_count
    }

    pub fn duration(&self) -> u64 {
        self.duration
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Watch URL for a video id
pub fn watch_url(id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", urlencoding::encode(id))
}

/// Source of items for a collection (a channel, a playlist, ...)
#[async_trait]
pub trait ItemLister: Send + Sync {
    /// List up to `max_items` items of a collection, most viewed first.
    ///
    /// Never fails: an unusable listing is logged and reported as no items.
    async fn list_items(&self, collection_ref: &str, max_items: Option<usize>) -> Vec<Item>;
}
