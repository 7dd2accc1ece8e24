use std::sync::Arc;

use domain::{DomainError, RepositoryError, User, UserId, Username};

use crate::{
    clock::Clock, error::ApplicationError, password::PasswordHasher, repository::UserRepository,
};

#[derive(Debug, Clone)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AuthenticateUserRequest {
    pub username: String,
    pub password: String,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

fn require_password(password: &str) -> Result<(), DomainError> {
    if password.is_empty() {
        return Err(DomainError::invalid_argument("password", "cannot be empty"));
    }
    Ok(())
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;
        require_password(&request.password)?;

        if self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(&request.password).await?;
        let user = User::register(
            UserId::generate(),
            username,
            password_hash,
            self.deps.clock.now(),
        );

        match self.deps.user_repository.create(user).await {
            Ok(stored) => {
                tracing::info!(user_id = %stored.id, username = %stored.username, "user registered");
                Ok(stored)
            }
            Err(RepositoryError::Conflict) => Err(DomainError::UserAlreadyExists.into()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<User, ApplicationError> {
        let username = Username::parse(request.username)?;
        require_password(&request.password)?;

        let user = self
            .deps
            .user_repository
            .find_by_username(&username)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&request.password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(user)
    }
}
