mod fetch;
mod parse;

pub use fetch::FeedRetriever;
pub use parse::{Episode, UNTITLED_EPISODE, parse_feed};
