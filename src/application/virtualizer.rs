//! Windowing over a paginated list.
//!
//! Only the items in (or near) the viewport are materialized. Each index is
//! mapped to its page by division on a fixed page size, and reaching the last
//! loaded index pulls in the next page.

use std::ops::Range;

use agora_api_types::EntityId;

use crate::application::error::ClientError;
use crate::application::pagination::{PageSource, Paginator};
use crate::config::ListSettings;
use crate::domain::entities::{Comment, Post};

const DEFAULT_ESTIMATE: u32 = 400;
const DEFAULT_PAGE_SIZE: u32 = 10;
const DEFAULT_OVERSCAN: u32 = 5;

/// Items with a stable identity across refetches.
pub trait Keyed {
    fn key(&self) -> EntityId;
}

impl Keyed for Post {
    fn key(&self) -> EntityId {
        self.id()
    }
}

impl Keyed for Comment {
    fn key(&self) -> EntityId {
        self.id()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Entity(EntityId),
    /// The slot's page is not loaded.
    Placeholder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualItem {
    pub index: usize,
    pub page: usize,
    pub offset_in_page: usize,
    pub start: u64,
    pub size: u32,
    pub key: ItemKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub scroll_offset: u64,
    pub height: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualizerConfig {
    pub estimate: u32,
    pub page_size: u32,
    pub overscan: u32,
}

impl Default for VirtualizerConfig {
    fn default() -> Self {
        Self {
            estimate: DEFAULT_ESTIMATE,
            page_size: DEFAULT_PAGE_SIZE,
            overscan: DEFAULT_OVERSCAN,
        }
    }
}

impl From<&ListSettings> for VirtualizerConfig {
    fn from(settings: &ListSettings) -> Self {
        Self {
            estimate: settings.item_estimate.get(),
            page_size: settings.page_size.get(),
            overscan: settings.overscan,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Virtualizer {
    config: VirtualizerConfig,
}

impl Virtualizer {
    pub fn new(config: VirtualizerConfig) -> Self {
        Self {
            config: VirtualizerConfig {
                estimate: config.estimate.max(1),
                page_size: config.page_size.max(1),
                overscan: config.overscan,
            },
        }
    }

    pub fn config(&self) -> &VirtualizerConfig {
        &self.config
    }

    pub fn total_size(&self, count: usize) -> u64 {
        count as u64 * u64::from(self.config.estimate)
    }

    /// Indices intersecting the viewport, widened by the overscan.
    pub fn visible_range(&self, count: usize, viewport: Viewport) -> Range<usize> {
        if count == 0 {
            return 0..0;
        }

        let estimate = u64::from(self.config.estimate);
        let overscan = self.config.overscan as usize;
        let first = to_index(viewport.scroll_offset / estimate).min(count - 1);
        let end = to_index((viewport.scroll_offset + viewport.height).div_ceil(estimate))
            .clamp(first + 1, count);

        first.saturating_sub(overscan)..end.saturating_add(overscan).min(count)
    }

    /// `(page_index, offset_in_page)` of a list index.
    pub fn slot(&self, index: usize) -> (usize, usize) {
        let page_size = self.config.page_size as usize;
        (index / page_size, index % page_size)
    }

    pub fn window<S>(&self, list: &Paginator<S>, viewport: Viewport) -> Vec<VirtualItem>
    where
        S: PageSource,
        S::Item: Keyed,
    {
        self.visible_range(list.len(), viewport)
            .map(|index| {
                let (page, offset_in_page) = self.slot(index);
                let key = list
                    .pages()
                    .get(page)
                    .and_then(|items| items.get(offset_in_page))
                    .map_or(ItemKey::Placeholder, |item| ItemKey::Entity(item.key()));

                VirtualItem {
                    index,
                    page,
                    offset_in_page,
                    start: index as u64 * u64::from(self.config.estimate),
                    size: self.config.estimate,
                    key,
                }
            })
            .collect()
    }

    /// Whether the window touches the end of a list that may continue.
    pub fn wants_next_page<S: PageSource>(
        &self,
        list: &Paginator<S>,
        window: &[VirtualItem],
    ) -> bool {
        let Some(last) = window.last() else {
            return false;
        };

        last.index + 1 == list.len() && list.has_next_page() && !list.is_loading()
    }

    /// Computes the window and fetches the next page when the window reaches
    /// the end. An untouched list loads its first page.
    pub async fn sync<S>(
        &self,
        list: &mut Paginator<S>,
        viewport: Viewport,
    ) -> Result<Vec<VirtualItem>, ClientError>
    where
        S: PageSource,
        S::Item: Keyed,
    {
        list.refresh_if_stale();
        if list.is_empty() && list.has_next_page() {
            list.load_next().await?;
        }

        let window = self.window(list, viewport);
        if self.wants_next_page(list, &window) {
            list.load_next().await?;
            return Ok(self.window(list, viewport));
        }
        Ok(window)
    }
}

impl Default for Virtualizer {
    fn default() -> Self {
        Self::new(VirtualizerConfig::default())
    }
}

fn to_index(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}
