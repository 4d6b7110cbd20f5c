//! Dated journal pages kept in a cookie-like key-value store.
//!
//! [`page_store::PageStore`] owns the pages and writes them through after
//! every change, [`date_filter::DateFilterView`] narrows them to one day, and
//! [`journal::Journal`] ties the two together for the terminal front end.

pub mod app;
pub mod config;
pub mod cookie_jar;
pub mod date_filter;
pub mod editor;
pub mod journal;
pub mod page;
pub mod page_store;
pub mod store;
pub mod ui;
