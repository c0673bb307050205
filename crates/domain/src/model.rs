//! Domain models and value objects

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Counters kept on every account document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountMetrics {
    pub followers_count: u64,
    pub following_count: u64,
    pub total_tweets_count: u64,
    pub total_retweets_count: u64,
    pub total_likes_count: u64,
}

/// A registered account as stored in the `Users` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Account {
    /// Internal user record ID
    pub uuid: String,
    /// Public-facing handle used for follow relationships
    pub account_id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
    /// Password hash, never the plain text
    pub password: String,
    pub metrics: AccountMetrics,
    #[serde(with = "unix_micros")]
    pub created_at: OffsetDateTime,
    #[serde(with = "unix_micros")]
    pub updated_at: OffsetDateTime,
}

impl Account {
    /// Generate a fresh public account handle: `#` followed by ten upper-case hex digits
    pub fn generate_account_id() -> String {
        let id = Uuid::new_v4();
        let hex: String = id.as_bytes()[..5]
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect();
        format!("#{}", hex)
    }
}

/// Engagement counters of a single tweet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweetMetrics {
    pub retweets_count: u64,
    pub likes_count: u64,
    pub comments_count: u64,
    /// Derived once at creation time
    pub characters_count: u64,
}

/// A tweet as stored in the `Tweets` collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TweetRecord {
    pub user_uuid: String,
    pub account_id: String,
    pub tweet_uuid: String,
    pub email: String,
    pub tweet: String,
    pub metrics: TweetMetrics,
    #[serde(with = "unix_micros")]
    pub created_at: OffsetDateTime,
    #[serde(with = "unix_micros")]
    pub updated_at: OffsetDateTime,
}

impl TweetRecord {
    /// Build a new tweet authored by `author` at `now`
    pub fn new(author: &Account, text: &str, now: OffsetDateTime) -> Self {
        Self {
            user_uuid: author.uuid.clone(),
            account_id: author.account_id.clone(),
            tweet_uuid: Uuid::new_v4().to_string(),
            email: author.email.clone(),
            tweet: text.to_string(),
            metrics: TweetMetrics {
                characters_count: text.chars().count() as u64,
                ..Default::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    /// Strip bookkeeping fields, keeping the public shape
    pub fn view(&self) -> Tweet {
        Tweet {
            tweet_uuid: self.tweet_uuid.clone(),
            tweet: self.tweet.clone(),
            metrics: self.metrics,
        }
    }
}

/// The public projection of a tweet returned by listings and feeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Tweet {
    pub tweet_uuid: String,
    pub tweet: String,
    pub metrics: TweetMetrics,
}

impl Tweet {
    /// Fields kept by the tweet projection
    pub const PROJECTION: [&'static str; 3] = ["tweet_uuid", "tweet", "metrics"];
}

/// A directed follow relationship stored in the `Followers` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FollowEdge {
    pub id: String,
    /// The account doing the following
    pub follower_account_id: String,
    /// The account being followed
    pub following_account_id: String,
}

impl FollowEdge {
    pub fn new(follower_account_id: &str, following_account_id: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            follower_account_id: follower_account_id.to_string(),
            following_account_id: following_account_id.to_string(),
        }
    }
}

/// Verified identity of a caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_uuid: String,
    pub account_id: String,
    /// Expiry as seconds since the Unix epoch
    pub exp: i64,
}

/// Where a tweet listing was served from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedSource {
    Cache,
    Store,
}

/// Signup request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub email: String,
    pub password: String,
}

/// Sign-in request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
}

/// Response envelope shared by every operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweets: Option<Vec<Tweet>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<FeedSource>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn with_type(mut self, response_type: &str, msg: impl Into<String>) -> Self {
        self.response_type = Some(response_type.to_string());
        self.msg = Some(msg.into());
        self
    }

    pub fn with_tweets(mut self, tweets: Vec<Tweet>, source: FeedSource) -> Self {
        self.tweets = Some(tweets);
        self.source = Some(source);
        self
    }

    pub fn with_token(mut self, token: String) -> Self {
        self.token = Some(token);
        self
    }
}

/// Timestamps are persisted as microseconds since the Unix epoch so that
/// stores can order them numerically.
pub mod unix_micros {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use time::OffsetDateTime;

    pub fn serialize<S: Serializer>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        let micros = value.unix_timestamp_nanos() / 1_000;
        serializer.serialize_i64(micros as i64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<OffsetDateTime, D::Error> {
        let micros = i64::deserialize(deserializer)?;
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(micros) * 1_000).map_err(D::Error::custom)
    }
}
