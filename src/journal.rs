use crate::date_filter::DateFilterView;
use crate::page::{Page, PageId};
use crate::page_store::{Durability, LoadOutcome, PageStore};
use crate::store::KeyValueStore;
use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

/// Pages plus the date-filtered view over them. Every mutation goes through
/// the store first, then the view is recomputed.
pub struct Journal<S: KeyValueStore> {
    store: PageStore<S>,
    view: DateFilterView,
}

impl<S: KeyValueStore> Journal<S> {
    pub fn load(store: S, selected: Option<NaiveDate>) -> (Self, LoadOutcome) {
        let (store, outcome) = PageStore::load(store);
        let view = DateFilterView::new(store.pages(), selected);
        (Journal { store, view }, outcome)
    }

    pub fn pages(&self) -> &[Page] {
        self.store.pages()
    }

    pub fn page(&self, id: PageId) -> Option<&Page> {
        self.store.get(id)
    }

    pub fn view(&self) -> &DateFilterView {
        &self.view
    }

    pub fn store(&self) -> &PageStore<S> {
        &self.store
    }

    /// Pages in the filtered view, in collection order.
    pub fn visible(&self) -> impl Iterator<Item = &Page> + '_ {
        self.view
            .filtered()
            .iter()
            .filter_map(move |&id| self.store.get(id))
    }

    pub fn active_page(&self) -> Option<&Page> {
        self.view.active_id().and_then(|id| self.store.get(id))
    }

    pub fn is_today_selected(&self) -> bool {
        self.view.is_today_selected()
    }

    pub fn add_page(&mut self) -> (PageId, Durability) {
        self.add_page_at(Utc::now())
    }

    /// Adds a page stamped `now`, switches the filter to that day and leaves
    /// the new page open.
    pub fn add_page_at(&mut self, now: DateTime<Utc>) -> (PageId, Durability) {
        let (id, durability) = self.store.add_entry_at(now);
        self.view.activate(id);
        self.view
            .set_date_filter(self.store.pages(), Some(now.date_naive()), true);
        (id, durability)
    }

    /// Deletes a page and closes whatever page was open.
    pub fn delete_page(&mut self, id: PageId) -> Durability {
        let durability = self.store.delete_entry(id);
        self.view.close_entry();
        self.view.refresh(self.store.pages());
        durability
    }

    pub fn delete_active_page(&mut self) -> Option<Durability> {
        let id = self.view.active_id()?;
        Some(self.delete_page(id))
    }

    pub fn update_page(&mut self, id: PageId, content: &str) -> Durability {
        let durability = self.store.update_content(id, content);
        self.view.refresh(self.store.pages());
        durability
    }

    pub fn filter_by_date(&mut self, date: Option<NaiveDate>) {
        debug!(?date, "date filter changed");
        self.view.set_date_filter(self.store.pages(), date, false);
    }

    pub fn open_page(&mut self, index: usize) -> bool {
        self.view.open_entry(index)
    }

    pub fn close_page(&mut self) {
        self.view.close_entry();
    }

    /// Save and close: rewrites the collection, re-applies the date filter and
    /// closes the open page. `None` when no page was open.
    pub fn save_page(&mut self) -> Option<Durability> {
        self.view.active_id()?;
        let durability = self.store.persist();
        if let Some(date) = self.view.selected_date() {
            self.view
                .set_date_filter(self.store.pages(), Some(date), true);
        }
        self.view.close_entry();
        Some(durability)
    }
}
