//! Account lifecycle: signup, sign-in, password change, deletion

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::{
    error::ServiceError,
    model::{Account, AccountMetrics, Claims, CreateUserRequest, SignInRequest},
    ports::{Clock, PasswordHasher, TokenIssuer},
    repository::Repository,
    validate,
};

/// Default lifetime of an issued token
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(60 * 60);

/// Use case for creating, authenticating and deleting accounts
#[derive(Clone)]
pub struct AccountsUseCase {
    repo: Repository,
    hasher: Arc<dyn PasswordHasher>,
    issuer: Arc<dyn TokenIssuer>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl AccountsUseCase {
    pub fn new(
        repo: Repository,
        hasher: Arc<dyn PasswordHasher>,
        issuer: Arc<dyn TokenIssuer>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            repo,
            hasher,
            issuer,
            clock,
            token_ttl,
        }
    }

    /// Register a new account with zeroed counters
    pub async fn create_user(&self, req: &CreateUserRequest) -> Result<Account, ServiceError> {
        validate::require("firstname", &req.first_name)?;
        validate::require("lastname", &req.last_name)?;
        validate::require("email", &req.email)?;
        validate::password_length(&req.password)?;
        validate::minimum_age(req.age)?;

        if self.repo.email_exists(&req.email).await? {
            return Err(ServiceError::AlreadyExists);
        }

        let password = self.hasher.hash(&req.password)?;
        let now = self.clock.now();
        let account = Account {
            uuid: Uuid::new_v4().to_string(),
            account_id: Account::generate_account_id(),
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            age: req.age,
            email: req.email.clone(),
            password,
            metrics: AccountMetrics::default(),
            created_at: now,
            updated_at: now,
        };

        self.repo.insert_account(&account).await?;

        tracing::info!(account_id = %account.account_id, "Account created");
        Ok(account)
    }

    /// Check credentials and issue a token
    pub async fn sign_in(&self, req: &SignInRequest) -> Result<String, ServiceError> {
        validate::require("email", &req.email)?;
        validate::require("password", &req.password)?;

        let account = self
            .repo
            .find_account_by_email(&req.email)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if !self.hasher.verify(&req.password, &account.password) {
            tracing::info!(account_id = %account.account_id, "Rejected sign-in");
            return Err(ServiceError::InvalidCredentials);
        }

        let token = self
            .issuer
            .issue(&account.uuid, &account.account_id, self.token_ttl)
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        tracing::info!(account_id = %account.account_id, "Signed in");
        Ok(token)
    }

    /// Replace the caller's password. Tokens issued earlier stay valid.
    pub async fn set_new_password(&self, claims: &Claims, password: &str) -> Result<(), ServiceError> {
        validate::password_length(password)?;

        let hash = self.hasher.hash(password)?;
        if !self.repo.update_password(&claims.user_uuid, &hash).await? {
            return Err(ServiceError::UserNotFound);
        }

        tracing::info!(account_id = %claims.account_id, "Password changed");
        Ok(())
    }

    /// Remove the caller's user record. Tweets and follow edges are left in place.
    pub async fn delete_user(&self, claims: &Claims) -> Result<(), ServiceError> {
        if !self.repo.delete_account(&claims.user_uuid).await? {
            return Err(ServiceError::UserNotFound);
        }
        tracing::info!(account_id = %claims.account_id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{AuthError, HashError, SystemClock};
    use crate::testing::FakeStore;

    struct PlainHasher;

    impl PasswordHasher for PlainHasher {
        fn hash(&self, password: &str) -> Result<String, HashError> {
            Ok(format!("hashed:{}", password))
        }

        fn verify(&self, password: &str, hash: &str) -> bool {
            hash == format!("hashed:{}", password)
        }
    }

    struct FakeIssuer;

    impl TokenIssuer for FakeIssuer {
        fn issue(&self, user_uuid: &str, account_id: &str, _ttl: Duration) -> Result<String, AuthError> {
            Ok(format!("{}|{}", user_uuid, account_id))
        }
    }

    fn usecase() -> (Arc<FakeStore>, AccountsUseCase) {
        let store = Arc::new(FakeStore::new());
        let accounts = AccountsUseCase::new(
            Repository::new(store.clone()),
            Arc::new(PlainHasher),
            Arc::new(FakeIssuer),
            Arc::new(SystemClock),
            DEFAULT_TOKEN_TTL,
        );
        (store, accounts)
    }

    fn request() -> CreateUserRequest {
        CreateUserRequest {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            age: 40,
            email: "grace@example.com".to_string(),
            password: "cobol-forever".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_hashes_password() {
        let (_, accounts) = usecase();
        let account = accounts.create_user(&request()).await.unwrap();

        assert_eq!(account.password, "hashed:cobol-forever");
        assert_eq!(account.metrics, AccountMetrics::default());
        assert!(account.account_id.starts_with('#'));
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let (_, accounts) = usecase();
        accounts.create_user(&request()).await.unwrap();

        let result = accounts.create_user(&request()).await;
        assert!(matches!(result, Err(ServiceError::AlreadyExists)));
    }

    #[tokio::test]
    async fn test_create_user_validates_before_store_access() {
        let (store, accounts) = usecase();

        let mut req = request();
        req.email.clear();
        assert!(matches!(
            accounts.create_user(&req).await,
            Err(ServiceError::FieldMissing("email"))
        ));

        let mut req = request();
        req.age = 10;
        assert!(matches!(
            accounts.create_user(&req).await,
            Err(ServiceError::FieldError(_))
        ));

        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_sign_in() {
        let (_, accounts) = usecase();
        let account = accounts.create_user(&request()).await.unwrap();

        let token = accounts
            .sign_in(&SignInRequest {
                email: "grace@example.com".to_string(),
                password: "cobol-forever".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(token, format!("{}|{}", account.uuid, account.account_id));

        let wrong = accounts
            .sign_in(&SignInRequest {
                email: "grace@example.com".to_string(),
                password: "fortran".to_string(),
            })
            .await;
        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));

        let unknown = accounts
            .sign_in(&SignInRequest {
                email: "nobody@example.com".to_string(),
                password: "whatever1".to_string(),
            })
            .await;
        assert!(matches!(unknown, Err(ServiceError::UserNotFound)));
    }

    fn claims_for(account: &Account) -> Claims {
        Claims {
            user_uuid: account.uuid.clone(),
            account_id: account.account_id.clone(),
            exp: 0,
        }
    }

    #[tokio::test]
    async fn test_set_new_password_replaces_credentials() {
        let (_, accounts) = usecase();
        let account = accounts.create_user(&request()).await.unwrap();

        accounts
            .set_new_password(&claims_for(&account), "flow-matic")
            .await
            .unwrap();

        let old = accounts
            .sign_in(&SignInRequest {
                email: "grace@example.com".to_string(),
                password: "cobol-forever".to_string(),
            })
            .await;
        assert!(matches!(old, Err(ServiceError::InvalidCredentials)));

        let new = accounts
            .sign_in(&SignInRequest {
                email: "grace@example.com".to_string(),
                password: "flow-matic".to_string(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn test_set_new_password_rejects_short_and_unknown() {
        let (store, accounts) = usecase();
        let account = accounts.create_user(&request()).await.unwrap();
        let mutations = store.mutations();

        let short = accounts.set_new_password(&claims_for(&account), "short").await;
        assert!(matches!(short, Err(ServiceError::FieldError(_))));
        assert_eq!(store.mutations(), mutations);

        let mut ghost = claims_for(&account);
        ghost.user_uuid = "missing".to_string();
        let result = accounts.set_new_password(&ghost, "long-enough").await;
        assert!(matches!(result, Err(ServiceError::UserNotFound)));
    }

    #[tokio::test]
    async fn test_delete_user() {
        let (_, accounts) = usecase();
        let account = accounts.create_user(&request()).await.unwrap();
        let claims = claims_for(&account);

        accounts.delete_user(&claims).await.unwrap();
        assert!(matches!(
            accounts.delete_user(&claims).await,
            Err(ServiceError::UserNotFound)
        ));
    }
}
