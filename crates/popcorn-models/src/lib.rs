pub mod movie;
pub mod query;
pub mod watched;

pub use movie::{parse_leading_number, parse_rating, MovieDetail, SearchResultItem};
pub use query::QueryState;
pub use watched::{average, summarize, WatchedEntry, WatchedSummary};
