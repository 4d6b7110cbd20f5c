use crate::page::{Page, PageId};
use chrono::{NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{input}' is not a date, expected YYYY-MM-DD")]
pub struct FilterError {
    pub input: String,
}

/// Blank input clears the filter.
pub fn parse_date_input(input: &str) -> Result<Option<NaiveDate>, FilterError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(Some)
        .map_err(|_| FilterError {
            input: input.to_string(),
        })
}

/// The pages visible for the selected date, plus the page open for editing.
///
/// The open page is tracked by id and resolved to a position in the filtered
/// list only on demand, so re-filtering never points it at another page.
#[derive(Debug, Default)]
pub struct DateFilterView {
    selected: Option<NaiveDate>,
    filtered: Vec<PageId>,
    active: Option<PageId>,
}

impl DateFilterView {
    pub fn new(pages: &[Page], selected: Option<NaiveDate>) -> Self {
        let mut view = DateFilterView::default();
        view.set_date_filter(pages, selected, false);
        view
    }

    pub fn set_date_filter(&mut self, pages: &[Page], date: Option<NaiveDate>, keep_active: bool) {
        if !keep_active {
            self.active = None;
        }
        self.selected = date;
        self.refresh(pages);
    }

    /// Recomputes the visible ids for the current selection.
    pub fn refresh(&mut self, pages: &[Page]) {
        self.filtered = pages
            .iter()
            .filter(|p| self.selected.map_or(true, |date| p.date() == date))
            .map(|p| p.id)
            .collect();
        if let Some(active) = self.active {
            if !pages.iter().any(|p| p.id == active) {
                self.active = None;
            }
        }
    }

    pub fn is_today_selected(&self) -> bool {
        self.is_today_selected_on(Utc::now().date_naive())
    }

    pub fn is_today_selected_on(&self, today: NaiveDate) -> bool {
        self.selected.map_or(true, |date| date == today)
    }

    /// Opens the page at `index` of the filtered list.
    pub fn open_entry(&mut self, index: usize) -> bool {
        match self.filtered.get(index) {
            Some(&id) => {
                self.active = Some(id);
                true
            }
            None => false,
        }
    }

    pub fn close_entry(&mut self) {
        self.active = None;
    }

    pub(crate) fn activate(&mut self, id: PageId) {
        self.active = Some(id);
    }

    pub fn selected_date(&self) -> Option<NaiveDate> {
        self.selected
    }

    pub fn filtered(&self) -> &[PageId] {
        &self.filtered
    }

    pub fn active_id(&self) -> Option<PageId> {
        self.active
    }

    /// Position of the open page in the filtered list, if it is visible.
    pub fn active_position(&self) -> Option<usize> {
        let active = self.active?;
        self.filtered.iter().position(|&id| id == active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn page(id: PageId, y: i32, m: u32, d: u32) -> Page {
        Page::new(id, Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn two_days() -> Vec<Page> {
        vec![page(1, 2024, 1, 1), page(2, 2024, 1, 2)]
    }

    #[test]
    fn no_date_shows_everything() {
        let pages = two_days();
        let view = DateFilterView::new(&pages, None);
        assert_eq!(view.filtered(), &[1, 2]);
        assert!(view.is_today_selected_on(date(2030, 5, 5)));
    }

    #[test]
    fn date_selects_matching_pages() {
        let pages = two_days();
        let mut view = DateFilterView::default();
        view.set_date_filter(&pages, Some(date(2024, 1, 1)), false);
        assert_eq!(view.filtered(), &[1]);
        assert!(!view.is_today_selected_on(date(2024, 1, 2)));
        assert!(view.is_today_selected_on(date(2024, 1, 1)));
    }

    #[test]
    fn common_date_returns_full_collection() {
        let pages = vec![page(1, 2024, 3, 3), page(2, 2024, 3, 3)];
        let view = DateFilterView::new(&pages, Some(date(2024, 3, 3)));
        assert_eq!(view.filtered(), &[1, 2]);
    }

    #[test]
    fn far_future_date_matches_nothing() {
        let pages = two_days();
        let view = DateFilterView::new(&pages, Some(date(2099, 1, 1)));
        assert!(view.filtered().is_empty());
    }

    #[test]
    fn filtering_clears_selection_unless_kept() {
        let pages = two_days();
        let mut view = DateFilterView::new(&pages, None);
        assert!(view.open_entry(1));

        view.set_date_filter(&pages, Some(date(2024, 1, 2)), true);
        assert_eq!(view.active_id(), Some(2));
        assert_eq!(view.active_position(), Some(0));

        view.set_date_filter(&pages, None, false);
        assert_eq!(view.active_id(), None);
    }

    #[test]
    fn open_out_of_range_is_ignored() {
        let pages = two_days();
        let mut view = DateFilterView::new(&pages, Some(date(2024, 1, 1)));
        assert!(!view.open_entry(1));
        assert_eq!(view.active_id(), None);
    }

    #[test]
    fn hidden_active_page_has_no_position() {
        let pages = two_days();
        let mut view = DateFilterView::new(&pages, None);
        view.open_entry(0);
        view.set_date_filter(&pages, Some(date(2024, 1, 2)), true);
        assert_eq!(view.active_id(), Some(1));
        assert_eq!(view.active_position(), None);
    }

    #[test]
    fn refresh_drops_vanished_active_page() {
        let mut pages = two_days();
        let mut view = DateFilterView::new(&pages, None);
        view.open_entry(1);
        pages.pop();
        view.refresh(&pages);
        assert_eq!(view.active_id(), None);
        assert_eq!(view.filtered(), &[1]);
    }

    #[test]
    fn parses_date_input() {
        assert_eq!(parse_date_input(""), Ok(None));
        assert_eq!(parse_date_input(" 2024-01-01 "), Ok(Some(date(2024, 1, 1))));
        assert_eq!(
            parse_date_input("01/02/2024"),
            Err(FilterError {
                input: "01/02/2024".to_string()
            })
        );
    }
}
