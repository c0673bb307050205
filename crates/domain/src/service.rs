//! Service facade: request validation, authentication and response shaping
//!
//! Each operation validates required fields first, then verifies the token,
//! and only then touches the store. Failures become a `Response` with
//! `success = false` and no payload.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    error::ServiceError,
    model::{Claims, CreateUserRequest, FeedSource, Response, SignInRequest},
    ports::{Cache, Clock, DocumentStore, IdentityVerifier, PasswordHasher, TokenIssuer},
    repository::Repository,
    usecases::{
        AccountsUseCase, DEFAULT_TOKEN_TTL, DEFAULT_TWEET_LIMIT, FeedAssembler, FollowGraph,
        FollowOutcome, PostTweetUseCase, TweetListingCache, TweetQuery,
    },
    validate,
};

/// Tunables of the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Maximum tweets per listing or feed
    pub tweet_limit: usize,
    /// Lifetime of tokens issued at sign-in
    pub token_ttl: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            tweet_limit: DEFAULT_TWEET_LIMIT,
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

/// External collaborators injected into the service
#[derive(Clone)]
pub struct Dependencies {
    pub store: Arc<dyn DocumentStore>,
    pub cache: Arc<dyn Cache>,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub issuer: Arc<dyn TokenIssuer>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

/// The social network backend
#[derive(Clone)]
pub struct SocialService {
    verifier: Arc<dyn IdentityVerifier>,
    accounts: AccountsUseCase,
    tweets: PostTweetUseCase,
    graph: FollowGraph,
    listing: TweetListingCache,
    feed: FeedAssembler,
}

impl SocialService {
    pub fn new(deps: Dependencies, config: ServiceConfig) -> Self {
        let repo = Repository::new(deps.store);
        let query = TweetQuery::new(repo.clone(), config.tweet_limit);
        let graph = FollowGraph::new(repo.clone());

        Self {
            verifier: deps.verifier,
            accounts: AccountsUseCase::new(
                repo.clone(),
                deps.hasher,
                deps.issuer,
                deps.clock.clone(),
                config.token_ttl,
            ),
            tweets: PostTweetUseCase::new(repo, deps.clock),
            listing: TweetListingCache::new(deps.cache, query.clone()),
            feed: FeedAssembler::new(graph.clone(), query),
            graph,
        }
    }

    pub async fn create_user(&self, req: &CreateUserRequest) -> Response {
        let result = self.accounts.create_user(req).await.map(|_| {
            Response::ok().with_type("NEW_USER_CREATED", "New user was added and saved to the db.")
        });
        respond("create_user", result)
    }

    pub async fn sign_in(&self, req: &SignInRequest) -> Response {
        let result = self
            .accounts
            .sign_in(req)
            .await
            .map(|token| Response::ok().with_token(token));
        respond("sign_in", result)
    }

    /// Change the caller's password; the length check runs before the token is verified
    pub async fn set_new_password(&self, token: &str, password: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            validate::require("token", token)?;
            validate::require("password", password)?;
            validate::password_length(password)?;
            let claims = self.authenticate(token)?;
            self.accounts.set_new_password(&claims, password).await?;
            Ok(Response::ok().with_type("PASSWORD_UPDATED", "Password has been successfully updated."))
        }
        .await;
        respond("set_new_password", result)
    }

    pub async fn delete_user(&self, token: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            let claims = self.authenticate(token)?;
            self.accounts.delete_user(&claims).await?;
            Ok(Response::ok().with_type("USER_DELETED", "User has been successfully deleted."))
        }
        .await;
        respond("delete_user", result)
    }

    pub async fn create_tweet(&self, token: &str, text: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            validate::require("token", token)?;
            validate::require("tweet", text)?;
            let claims = self.authenticate(token)?;
            self.tweets.create_tweet(&claims, text).await?;
            Ok(Response::ok().with_type("TWEET_SAVED", "Tweet saved to db successfully."))
        }
        .await;
        respond("create_tweet", result)
    }

    /// The caller's own tweets, possibly served from the cache
    pub async fn get_tweets(&self, token: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            let claims = self.authenticate(token)?;
            let (tweets, source) = self
                .listing
                .get_tweets(&claims.user_uuid, &claims.account_id)
                .await?;
            Ok(Response::ok().with_tweets(tweets, source))
        }
        .await;
        respond("get_tweets", result)
    }

    pub async fn follow(&self, token: &str, following_account_id: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            validate::require("token", token)?;
            validate::require("following_account_id", following_account_id)?;
            let claims = self.authenticate(token)?;
            let response = match self.graph.follow(&claims.account_id, following_account_id).await? {
                FollowOutcome::Created => Response::ok(),
                FollowOutcome::AlreadyFollowing => {
                    Response::ok().with_type("ALREADY_FOLLOWING", "Account is already followed.")
                }
            };
            Ok(response)
        }
        .await;
        respond("follow", result)
    }

    /// Newest tweets of every account the caller follows
    pub async fn feed(&self, token: &str) -> Response {
        let result: Result<Response, ServiceError> = async {
            let claims = self.authenticate(token)?;
            let tweets = self.feed.feed(&claims.account_id).await?;
            Ok(Response::ok().with_tweets(tweets, FeedSource::Store))
        }
        .await;
        respond("feed", result)
    }

    fn authenticate(&self, token: &str) -> Result<Claims, ServiceError> {
        validate::require("token", token)?;
        self.verifier
            .verify(token)
            .map_err(ServiceError::InvalidToken)
    }
}

fn respond(operation: &'static str, result: Result<Response, ServiceError>) -> Response {
    match result {
        Ok(response) => response,
        Err(error) => {
            if error.status_code() >= 500 {
                tracing::error!(operation, error = %error, "Operation failed");
            } else {
                tracing::info!(operation, error = %error, "Operation rejected");
            }
            error.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Collection;
    use crate::ports::{AuthError, HashError};
    use crate::testing::{FakeCache, FakeStore};
    use std::sync::atomic::{AtomicI64, Ordering};
    use time::OffsetDateTime;

    /// Tokens look like `valid:<user_uuid>:<account_id>`
    struct FakeAuth;

    impl IdentityVerifier for FakeAuth {
        fn verify(&self, token: &str) -> Result<Claims, AuthError> {
            let mut parts = token.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("valid"), Some(user_uuid), Some(account_id)) => Ok(Claims {
                    user_uuid: user_uuid.to_string(),
                    account_id: account_id.to_string(),
                    exp: i64::MAX,
                }),
                _ => Err(AuthError::InvalidToken("malformed".to_string())),
            }
        }
    }

    impl TokenIssuer for FakeAuth {
        fn issue(&self, user_uuid: &str, account_id: &str, _ttl: Duration) -> Result<String, AuthError> {
            Ok(format!("valid:{}:{}", user_uuid, account_id))
        }
    }

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, HashError> {
            Ok(format!("hashed:{}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("hashed:{}", password)
        }
    }

    /// Each call advances one second
    struct TickingClock(AtomicI64);

    impl Clock for TickingClock {
        fn now(&self) -> OffsetDateTime {
            let secs = self.0.fetch_add(1, Ordering::SeqCst);
            OffsetDateTime::from_unix_timestamp(1_700_000_000 + secs).unwrap()
        }
    }

    fn service() -> (Arc<FakeStore>, SocialService) {
        let store = Arc::new(FakeStore::new());
        let auth = Arc::new(FakeAuth);
        let deps = Dependencies {
            store: store.clone(),
            cache: Arc::new(FakeCache::new()),
            verifier: auth.clone(),
            issuer: auth,
            hasher: Arc::new(PlainHasher),
            clock: Arc::new(TickingClock(AtomicI64::new(0))),
        };
        (store, SocialService::new(deps, ServiceConfig::default()))
    }

    async fn signup(service: &SocialService, name: &str) -> (String, String) {
        let email = format!("{}@example.com", name);
        let created = service
            .create_user(&CreateUserRequest {
                first_name: name.to_string(),
                last_name: "Tester".to_string(),
                age: 20,
                email: email.clone(),
                password: "password123".to_string(),
            })
            .await;
        assert!(created.success, "{:?}", created);

        let signed_in = service
            .sign_in(&SignInRequest {
                email,
                password: "password123".to_string(),
            })
            .await;
        let token = signed_in.token.unwrap();
        let account_id = token.rsplit(':').next().unwrap().to_string();
        (token, account_id)
    }

    #[tokio::test]
    async fn test_feed_scenario() {
        let (_, service) = service();
        let (c, _) = signup(&service, "c").await;
        let (x, x_id) = signup(&service, "x").await;
        let (y, y_id) = signup(&service, "y").await;

        assert!(service.follow(&c, &x_id).await.success);
        assert!(service.follow(&c, &y_id).await.success);

        assert!(service.create_tweet(&x, "t1").await.success);
        assert!(service.create_tweet(&y, "t2").await.success);
        assert!(service.create_tweet(&x, "t3").await.success);

        let feed = service.feed(&c).await;
        assert!(feed.success);
        let texts: Vec<_> = feed.tweets.unwrap().into_iter().map(|t| t.tweet).collect();
        assert_eq!(texts, vec!["t3", "t2", "t1"]);
    }

    #[tokio::test]
    async fn test_get_tweets_served_from_cache_and_stale() {
        let (store, service) = service();
        let (a, _) = signup(&service, "a").await;
        service.create_tweet(&a, "one").await;

        let first = service.get_tweets(&a).await;
        assert_eq!(first.source, Some(FeedSource::Store));

        service.create_tweet(&a, "two").await;
        let calls = store.calls();
        let second = service.get_tweets(&a).await;

        assert_eq!(second.source, Some(FeedSource::Cache));
        assert_eq!(store.calls(), calls);
        assert_eq!(first.tweets, second.tweets);
    }

    #[tokio::test]
    async fn test_invalid_token_rejected_without_mutation() {
        let (store, service) = service();
        let (_, b_id) = signup(&service, "b").await;
        let mutations = store.mutations();
        let calls = store.calls();

        let responses = vec![
            service.create_tweet("forged", "hi").await,
            service.follow("forged", &b_id).await,
            service.feed("forged").await,
            service.get_tweets("forged").await,
            service.delete_user("forged").await,
        ];

        for response in responses {
            assert!(!response.success);
            assert_eq!(response.response_type.as_deref(), Some("INVALID_TOKEN"));
            assert!(response.tweets.is_none());
        }
        assert_eq!(store.mutations(), mutations);
        assert_eq!(store.calls(), calls);
    }

    #[tokio::test]
    async fn test_missing_fields() {
        let (_, service) = service();

        let response = service.feed("").await;
        assert_eq!(response.response_type.as_deref(), Some("FIELD_MISSING"));
        assert_eq!(response.msg.as_deref(), Some("Field token is missing, or empty."));

        let response = service.follow("valid:u:#A", "").await;
        assert_eq!(response.response_type.as_deref(), Some("FIELD_MISSING"));
    }

    #[tokio::test]
    async fn test_follow_twice_single_edge() {
        let (store, service) = service();
        let (a, _) = signup(&service, "a").await;
        let (_, b_id) = signup(&service, "b").await;

        assert!(service.follow(&a, &b_id).await.success);
        let again = service.follow(&a, &b_id).await;
        assert!(again.success);
        assert_eq!(again.response_type.as_deref(), Some("ALREADY_FOLLOWING"));
        assert_eq!(store.all(Collection::Followers).len(), 1);
    }

    #[tokio::test]
    async fn test_set_new_password_then_sign_in() {
        let (store, service) = service();
        let (a, _) = signup(&service, "a").await;

        let mutations = store.mutations();
        let short = service.set_new_password("forged", "short").await;
        assert_eq!(short.response_type.as_deref(), Some("FIELD_ERROR"));
        let missing = service.set_new_password(&a, "").await;
        assert_eq!(missing.response_type.as_deref(), Some("FIELD_MISSING"));
        let forged = service.set_new_password("forged", "new-password").await;
        assert_eq!(forged.response_type.as_deref(), Some("INVALID_TOKEN"));
        assert_eq!(store.mutations(), mutations);

        let changed = service.set_new_password(&a, "new-password").await;
        assert!(changed.success);
        assert_eq!(changed.response_type.as_deref(), Some("PASSWORD_UPDATED"));

        let old = service
            .sign_in(&SignInRequest {
                email: "a@example.com".to_string(),
                password: "password123".to_string(),
            })
            .await;
        assert_eq!(old.response_type.as_deref(), Some("INVALID_CREDENTIALS"));

        let new = service
            .sign_in(&SignInRequest {
                email: "a@example.com".to_string(),
                password: "new-password".to_string(),
            })
            .await;
        assert!(new.success);
        assert!(new.token.is_some());
    }

    #[tokio::test]
    async fn test_store_failure_returns_no_partial_feed() {
        let (store, service) = service();
        let (a, _) = signup(&service, "a").await;
        store.fail_reads();

        let response = service.feed(&a).await;
        assert!(!response.success);
        assert_eq!(response.response_type.as_deref(), Some("UNKNOWN_ERROR"));
        assert!(response.tweets.is_none());
    }
}
