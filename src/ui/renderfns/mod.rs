pub mod card;
pub mod footer;
pub mod header;
pub mod pager;
pub mod utils;

pub use card::card_lines;
pub use footer::draw_footer;
pub use header::{draw_header, extract_domain};
pub use pager::pager_line;
pub use utils::{origin_badge, truncate, wrap_text};
