mod article;
mod feed;
mod search;

pub use article::ArticleView;
pub use feed::FeedTabView;
pub use search::SearchView;
