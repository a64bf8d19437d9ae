use std::sync::Arc;

use argon2::{Algorithm, Argon2, Params, Version};
use markwise_core::models::teacher::{EmailClaim, TeacherAccount, normalize_email};
use markwise_core::store_keys;
use markwise_storage::state::{create_state, load_state, load_state_opt, save_state};
use markwise_storage::{Bucket, StorageError, objects};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::AuthError;
use crate::password::{self, MIN_PASSWORD_LEN};

/// Hashed once at startup so unknown-email logins cost the same as
/// wrong-password logins.
const DUMMY_PASSWORD: &str = "markwise-dummy-password";

pub struct IdentityStore {
    bucket: Arc<Bucket>,
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl IdentityStore {
    pub async fn new(bucket: Arc<Bucket>) -> Result<Self, AuthError> {
        Self::with_params(bucket, Params::default()).await
    }

    /// Use explicit argon2 cost parameters.
    pub async fn with_params(bucket: Arc<Bucket>, params: Params) -> Result<Self, AuthError> {
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let dummy_hash = password::hash(&argon2, DUMMY_PASSWORD).await?;
        Ok(Self {
            bucket,
            argon2,
            dummy_hash,
        })
    }

    /// Create a teacher account. Emails are unique case-insensitively.
    pub async fn register(
        &self,
        display_name: &str,
        email: &str,
        password: &str,
    ) -> Result<TeacherAccount, AuthError> {
        let display_name = display_name.trim();
        let email = normalize_email(email);
        validate_registration(display_name, &email, password)?;

        let claim_key = store_keys::teacher_email(&email);
        if objects::object_exists(&self.bucket, &claim_key).await? {
            return Err(AuthError::DuplicateEmail);
        }

        let account = TeacherAccount {
            id: Uuid::new_v4(),
            display_name: display_name.to_string(),
            email: email.clone(),
            password_hash: password::hash(&self.argon2, password).await?,
            created_at: jiff::Timestamp::now(),
        };

        // Account first, claim second. Without its claim the account is
        // unreachable, so any failed claim removes it again.
        let account_key = store_keys::teacher(account.id);
        save_state(&self.bucket, &account_key, &account).await?;

        let claim = EmailClaim {
            teacher_id: account.id,
            email: email.clone(),
        };
        if let Err(claim_err) = create_state(&self.bucket, &claim_key, &claim).await {
            if let Err(e) = objects::delete_object(&self.bucket, &account_key).await {
                warn!(
                    teacher_id = %account.id,
                    error = %e,
                    "failed to remove orphaned account"
                );
            }
            return Err(match claim_err {
                StorageError::AlreadyExists { .. } => AuthError::DuplicateEmail,
                other => other.into(),
            });
        }

        info!(teacher_id = %account.id, "registered teacher");
        Ok(account)
    }

    /// Check an email/password pair.
    ///
    /// Unknown email and wrong password both yield
    /// [`AuthError::InvalidCredentials`].
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<TeacherAccount, AuthError> {
        let email = normalize_email(email);
        let claim: Option<EmailClaim> =
            load_state_opt(&self.bucket, &store_keys::teacher_email(&email)).await?;

        let Some(claim) = claim else {
            password::verify(&self.argon2, password, &self.dummy_hash).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let account_key = store_keys::teacher(claim.teacher_id);
        let account = match load_state::<TeacherAccount>(&self.bucket, &account_key).await {
            Ok((account, _)) => account,
            Err(StorageError::NotFound { .. }) => {
                warn!(
                    teacher_id = %claim.teacher_id,
                    "email claim points at a missing account"
                );
                password::verify(&self.argon2, password, &self.dummy_hash).await?;
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        if !password::verify(&self.argon2, password, &account.password_hash).await? {
            info!(teacher_id = %account.id, "failed login");
            return Err(AuthError::InvalidCredentials);
        }

        info!(teacher_id = %account.id, "teacher logged in");
        Ok(account)
    }

    pub async fn get(&self, id: Uuid) -> Result<TeacherAccount, AuthError> {
        match load_state(&self.bucket, &store_keys::teacher(id)).await {
            Ok((account, _)) => Ok(account),
            Err(StorageError::NotFound { .. }) => Err(AuthError::UnknownTeacher(id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Number of registered teachers.
    pub async fn count(&self) -> Result<usize, AuthError> {
        let keys = objects::list_objects(&self.bucket, store_keys::TEACHERS_PREFIX).await?;
        Ok(keys.len())
    }
}

pub fn validate_registration(
    display_name: &str,
    email: &str,
    password: &str,
) -> Result<(), AuthError> {
    if display_name.is_empty() {
        return Err(AuthError::InvalidInput(
            "name must not be empty".to_string(),
        ));
    }
    if !is_plausible_email(email) {
        return Err(AuthError::InvalidInput(format!(
            "'{email}' is not a valid email address"
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}
