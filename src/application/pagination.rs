//! Page-numbered list loading.
//!
//! A `Paginator` turns successive page fetches into one growing list. Pages
//! are 1-based; the first empty page ends the list for good.

use async_trait::async_trait;
use tracing::debug;

use crate::application::error::ClientError;

/// Something that can produce numbered pages of items.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Clone + Send + Sync;

    async fn fetch_page(&self, page: u32) -> Result<Vec<Self::Item>, ClientError>;

    /// Whether the stored copy of `page` was explicitly marked stale.
    ///
    /// A copy that merely fell out of the cache does not count.
    fn is_page_invalidated(&self, _page: u32) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Empty,
    LoadingFirst,
    Idle,
    LoadingNext,
    Exhausted,
    Failed { page: u32, error: ClientError },
}

/// Permission to fetch one page. Tickets issued before a reset are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTicket {
    pub page: u32,
    epoch: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextPage {
    Fetch(PageTicket),
    /// A fetch is already running; the request was coalesced into it.
    InFlight,
    Exhausted,
    /// The page failed earlier and waits for an explicit retry.
    Failed { page: u32 },
}

pub struct Paginator<S: PageSource> {
    source: S,
    pages: Vec<Vec<S::Item>>,
    state: PageState,
    epoch: u64,
}

impl<S: PageSource> Paginator<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            pages: Vec::new(),
            state: PageState::Empty,
            epoch: 0,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn state(&self) -> &PageState {
        &self.state
    }

    pub fn pages(&self) -> &[Vec<S::Item>] {
        &self.pages
    }

    /// Items of every loaded page in request order.
    pub fn items(&self) -> impl Iterator<Item = &S::Item> {
        self.pages.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.pages.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<&S::Item> {
        self.items().nth(index)
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == PageState::Exhausted
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, PageState::LoadingFirst | PageState::LoadingNext)
    }

    /// Whether another page may exist and could be requested now.
    pub fn has_next_page(&self) -> bool {
        matches!(self.state, PageState::Empty | PageState::Idle)
    }

    /// Claims the next page, or reports why there is nothing to fetch.
    pub fn begin_next(&mut self) -> NextPage {
        match &self.state {
            PageState::Empty => {
                self.state = PageState::LoadingFirst;
                NextPage::Fetch(self.ticket(1))
            }
            PageState::Idle => {
                self.state = PageState::LoadingNext;
                NextPage::Fetch(self.ticket(self.next_page_number()))
            }
            PageState::LoadingFirst | PageState::LoadingNext => NextPage::InFlight,
            PageState::Exhausted => NextPage::Exhausted,
            PageState::Failed { page, .. } => NextPage::Failed { page: *page },
        }
    }

    /// Re-claims a failed page. Returns `None` unless the list is failed.
    pub fn retry(&mut self) -> Option<PageTicket> {
        let PageState::Failed { page, .. } = self.state else {
            return None;
        };

        self.state = if page == 1 {
            PageState::LoadingFirst
        } else {
            PageState::LoadingNext
        };
        Some(self.ticket(page))
    }

    /// Applies a page result. Returns `false` when the ticket was outdated.
    pub fn finish(
        &mut self,
        ticket: PageTicket,
        result: Result<Vec<S::Item>, ClientError>,
    ) -> bool {
        if ticket.epoch != self.epoch
            || !self.is_loading()
            || ticket.page != self.next_page_number()
        {
            debug!(page = ticket.page, "Dropping outdated page result");
            return false;
        }

        self.state = match result {
            Ok(items) if items.is_empty() => PageState::Exhausted,
            Ok(items) => {
                self.pages.push(items);
                PageState::Idle
            }
            Err(error) => PageState::Failed {
                page: ticket.page,
                error,
            },
        };
        true
    }

    /// Fetches the next page if one may be requested.
    ///
    /// Returns the number of items appended. Coalesced and exhausted calls
    /// append nothing; a failed list reports its error until `retry`.
    pub async fn load_next(&mut self) -> Result<usize, ClientError> {
        let ticket = match self.begin_next() {
            NextPage::Fetch(ticket) => ticket,
            NextPage::InFlight | NextPage::Exhausted => return Ok(0),
            NextPage::Failed { .. } => return Err(self.failure()),
        };
        self.run(ticket).await
    }

    pub async fn retry_failed(&mut self) -> Result<usize, ClientError> {
        match self.retry() {
            Some(ticket) => self.run(ticket).await,
            None => Ok(0),
        }
    }

    /// Drops every page and starts over at page 1.
    pub fn reset(&mut self) {
        self.pages.clear();
        self.state = PageState::Empty;
        self.epoch += 1;
    }

    /// Resets when the first page was invalidated since it was loaded.
    pub fn refresh_if_stale(&mut self) -> bool {
        if self.pages.is_empty() && self.state != PageState::Exhausted {
            return false;
        }
        if !self.source.is_page_invalidated(1) {
            return false;
        }

        debug!("First page is stale; restarting list");
        self.reset();
        true
    }

    async fn run(&mut self, ticket: PageTicket) -> Result<usize, ClientError> {
        let result = self.source.fetch_page(ticket.page).await;
        let appended = result.as_ref().map_or(0, Vec::len);
        self.finish(ticket, result);

        match &self.state {
            PageState::Failed { error, .. } => Err(error.clone()),
            _ => Ok(appended),
        }
    }

    fn failure(&self) -> ClientError {
        match &self.state {
            PageState::Failed { error, .. } => error.clone(),
            _ => ClientError::validation("list is not in a failed state"),
        }
    }

    fn next_page_number(&self) -> u32 {
        u32::try_from(self.pages.len()).map_or(u32::MAX, |loaded| loaded.saturating_add(1))
    }

    fn ticket(&self, page: u32) -> PageTicket {
        PageTicket {
            page,
            epoch: self.epoch,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::application::repos::ApiError;

    #[derive(Default)]
    struct ScriptedSource {
        pages: HashMap<u32, Result<Vec<u32>, ClientError>>,
        requested: Mutex<Vec<u32>>,
        stale: AtomicBool,
    }

    impl ScriptedSource {
        fn with_pages(pages: &[&[u32]]) -> Self {
            let mut source = Self::default();
            for (index, items) in pages.iter().enumerate() {
                let page = u32::try_from(index).expect("page") + 1;
                source.pages.insert(page, Ok(items.to_vec()));
            }
            source
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().expect("requested").clone()
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        type Item = u32;

        async fn fetch_page(&self, page: u32) -> Result<Vec<u32>, ClientError> {
            self.requested.lock().expect("requested").push(page);
            self.pages.get(&page).cloned().unwrap_or_else(|| Ok(Vec::new()))
        }

        fn is_page_invalidated(&self, _page: u32) -> bool {
            self.stale.load(Ordering::SeqCst)
        }
    }

    fn transport() -> ClientError {
        ClientError::Transport(ApiError::from_status(500, "boom"))
    }

    #[tokio::test]
    async fn concatenates_in_request_order_and_stops_at_empty_page() {
        let mut list = Paginator::new(ScriptedSource::with_pages(&[&[1, 2], &[3], &[]]));

        assert_eq!(list.load_next().await, Ok(2));
        assert_eq!(list.state(), &PageState::Idle);
        assert_eq!(list.load_next().await, Ok(1));
        assert_eq!(list.load_next().await, Ok(0));
        assert!(list.is_exhausted());

        assert_eq!(list.items().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(list.source().requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn exhausted_list_never_requests_again() {
        let mut list = Paginator::new(ScriptedSource::with_pages(&[&[1], &[]]));
        list.load_next().await.expect("page 1");
        list.load_next().await.expect("page 2");

        for _ in 0..3 {
            assert_eq!(list.load_next().await, Ok(0));
            assert_eq!(list.begin_next(), NextPage::Exhausted);
        }
        assert_eq!(list.source().requested(), vec![1, 2]);
    }

    #[test]
    fn second_request_while_loading_is_coalesced() {
        let mut list = Paginator::new(ScriptedSource::default());

        let NextPage::Fetch(ticket) = list.begin_next() else {
            panic!("first request should fetch");
        };
        assert_eq!(ticket.page, 1);
        assert_eq!(list.state(), &PageState::LoadingFirst);
        assert_eq!(list.begin_next(), NextPage::InFlight);

        assert!(list.finish(ticket, Ok(vec![7])));
        let NextPage::Fetch(next) = list.begin_next() else {
            panic!("idle list should fetch");
        };
        assert_eq!(next.page, 2);
        assert_eq!(list.state(), &PageState::LoadingNext);
        assert_eq!(list.begin_next(), NextPage::InFlight);
    }

    #[tokio::test]
    async fn failed_page_keeps_earlier_pages_until_retry() {
        let mut source = ScriptedSource::with_pages(&[&[1, 2]]);
        source.pages.insert(2, Err(transport()));
        let mut list = Paginator::new(source);

        list.load_next().await.expect("page 1");
        assert_eq!(list.load_next().await, Err(transport()));
        assert_eq!(
            list.state(),
            &PageState::Failed {
                page: 2,
                error: transport()
            }
        );
        assert_eq!(list.len(), 2);

        assert_eq!(list.load_next().await, Err(transport()));
        assert_eq!(list.source().requested(), vec![1, 2], "no silent retry");

        assert_eq!(list.retry_failed().await, Err(transport()));
        assert_eq!(list.source().requested(), vec![1, 2, 2]);
    }

    #[test]
    fn result_from_before_reset_is_ignored() {
        let mut list = Paginator::new(ScriptedSource::default());
        let NextPage::Fetch(old) = list.begin_next() else {
            panic!("fetch");
        };

        list.reset();
        let NextPage::Fetch(fresh) = list.begin_next() else {
            panic!("fetch");
        };

        assert!(!list.finish(old, Ok(vec![1])));
        assert!(list.is_empty());
        assert!(list.finish(fresh, Ok(vec![2])));
        assert_eq!(list.get(0), Some(&2));
    }

    #[tokio::test]
    async fn stale_first_page_restarts_at_page_one() {
        let mut list = Paginator::new(ScriptedSource::with_pages(&[&[1], &[2]]));
        list.load_next().await.expect("page 1");
        list.load_next().await.expect("page 2");

        assert!(!list.refresh_if_stale());
        list.source().stale.store(true, Ordering::SeqCst);
        assert!(list.refresh_if_stale());

        assert_eq!(list.state(), &PageState::Empty);
        assert_eq!(list.begin_next(), NextPage::Fetch(PageTicket { page: 1, epoch: 1 }));
    }
}
