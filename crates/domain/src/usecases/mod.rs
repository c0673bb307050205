//! Application use cases / business logic

pub mod accounts;
pub mod fanout;
pub mod feed;
pub mod feed_cache;
pub mod follow_graph;
pub mod tweets;

pub use accounts::{AccountsUseCase, DEFAULT_TOKEN_TTL};
pub use fanout::{DEFAULT_TWEET_LIMIT, TweetQuery};
pub use feed::FeedAssembler;
pub use feed_cache::{CACHE_KEY_PREFIX, TweetListingCache, cache_key};
pub use follow_graph::{FollowGraph, FollowOutcome};
pub use tweets::{MAX_TWEET_CHARS, PostTweetUseCase};
