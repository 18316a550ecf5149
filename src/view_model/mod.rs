//! Pure transformations from loaded pages to what the views draw.
//!
//! Nothing in here performs I/O; every function is deterministic in its inputs.

pub mod disclosure;
pub mod feed;
pub mod format;
pub mod grouping;
pub mod paging;

pub use disclosure::{split_initial_and_overflow, Disclosure};
pub use feed::{build_feed, FeedView, GroupView, ALL_GROUP};
pub use grouping::{date_groups, group_by_date, sorted_date_keys, DateGroup, UNKNOWN_DATE};
pub use paging::{date_info, page_window, paginate_date_keys, total_pages, DatePageSlice, NavKind, PageButton};
