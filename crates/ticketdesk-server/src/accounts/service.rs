//! Account operations behind the `/api/user` routes.

use tracing::{info, instrument, warn};

use super::types::{ChangePasswordInput, LoginInput, ProfileInput, RegisterInput};
use crate::auth::password;
use crate::auth::{AccessGuard, Principal, SessionToken};
use crate::error::{ServiceError, ServiceResult};
use crate::storage::{DatabaseError, NewUser, TicketDatabase, User, UserSummary};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Clone)]
pub struct AccountService {
    db: TicketDatabase,
    guard: AccessGuard,
}

impl AccountService {
    pub const fn new(db: TicketDatabase, guard: AccessGuard) -> Self {
        Self { db, guard }
    }

    /// Create an account.
    ///
    /// `is_admin` is honoured only for an admin caller, or for the very first
    /// account so a fresh deployment can bootstrap itself.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(
        &self,
        input: RegisterInput,
        caller: Option<&Principal>,
    ) -> ServiceResult<User> {
        let name = required("Name", &input.name)?;
        let email = normalize_email(&input.email)?;
        check_password(&input.password)?;

        match self.db.get_user_by_email(&email).await {
            Ok(_) => return Err(ServiceError::Conflict("User already exists".into())),
            Err(DatabaseError::NotFound(_)) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = password::hash_password(&input.password)?;

        let new_user = NewUser {
            name: &name,
            title: input.title.trim(),
            role: input.role.trim(),
            email: &email,
            password_hash: &password_hash,
            is_admin: input.is_admin,
        };
        let bootstrap = input.is_admin && !caller.is_some_and(|p| p.is_admin);

        let created = if bootstrap {
            self.db.create_first_admin(&new_user).await
        } else {
            self.db.create_user(&new_user).await.map(Some)
        };
        let user = created
            .map_err(|e| match e {
                DatabaseError::UniqueViolation(_) => {
                    ServiceError::Conflict("User already exists".into())
                }
                other => other.into(),
            })?
            .ok_or_else(|| {
                ServiceError::forbidden("Only an admin can register another admin")
            })?;

        info!(user_id = user.id, is_admin = user.is_admin, "User registered");
        Ok(user)
    }

    /// Check credentials and open a session.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn login(&self, input: LoginInput) -> ServiceResult<(User, SessionToken)> {
        let email = input.email.trim().to_lowercase();

        let user = match self.db.get_user_by_email(&email).await {
            Ok(user) => user,
            Err(DatabaseError::NotFound(_)) => {
                warn!("Login for unknown email");
                return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
            }
            Err(e) => return Err(e.into()),
        };

        if !password::verify_password(&input.password, &user.password_hash)? {
            warn!(user_id = user.id, "Failed login attempt");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        }

        if !user.is_active {
            warn!(user_id = user.id, "Login to deactivated account");
            return Err(ServiceError::unauthorized(
                "User account has been deactivated, contact the administrator",
            ));
        }

        let session = self.guard.issue_session(user.id)?;

        info!(user_id = user.id, "User logged in");
        Ok((user, session))
    }

    pub async fn list_team(&self) -> ServiceResult<Vec<UserSummary>> {
        let users = self.db.list_users().await?;
        Ok(users
            .into_iter()
            .map(|u| UserSummary {
                id: u.id,
                name: u.name,
                title: u.title,
                role: u.role,
                email: u.email,
            })
            .collect())
    }

    /// Edit the caller's profile, or another user's when the caller is an admin.
    #[instrument(skip(self, principal, input), fields(caller = principal.user_id))]
    pub async fn update_profile(
        &self,
        principal: &Principal,
        input: ProfileInput,
    ) -> ServiceResult<User> {
        let target = match input.id {
            Some(id) if id != principal.user_id => {
                AccessGuard::authorize_admin(principal)?;
                id
            }
            _ => principal.user_id,
        };
        let name = required("Name", &input.name)?;

        if !self
            .db
            .update_user_profile(target, &name, input.title.trim(), input.role.trim())
            .await?
        {
            return Err(ServiceError::not_found(format!("User {target}")));
        }

        info!(user_id = target, "Profile updated");
        Ok(self.db.get_user(target).await?)
    }

    #[instrument(skip_all, fields(user_id = principal.user_id))]
    pub async fn change_password(
        &self,
        principal: &Principal,
        input: ChangePasswordInput,
    ) -> ServiceResult<()> {
        check_password(&input.password)?;

        let password_hash = password::hash_password(&input.password)?;
        if !self
            .db
            .update_user_password(principal.user_id, &password_hash)
            .await?
        {
            return Err(ServiceError::not_found(format!("User {}", principal.user_id)));
        }

        info!("Password changed");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_active(&self, id: i64, is_active: bool) -> ServiceResult<User> {
        if !self.db.set_user_active(id, is_active).await? {
            return Err(ServiceError::not_found(format!("User {id}")));
        }

        info!(user_id = id, is_active, "Account status changed");
        Ok(self.db.get_user(id).await?)
    }

    /// Remove a user. Their team assignments go with them.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: i64) -> ServiceResult<()> {
        if !self.db.delete_user(id).await? {
            return Err(ServiceError::not_found(format!("User {id}")));
        }

        info!(user_id = id, "User deleted");
        Ok(())
    }
}

fn required(field: &str, value: &str) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

fn normalize_email(raw: &str) -> ServiceResult<String> {
    let email = required("Email", raw)?.to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(ServiceError::validation("Email address is invalid")),
    }
}

fn check_password(password: &str) -> ServiceResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
