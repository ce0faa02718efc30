//! Follow graph use-cases addressed by username.

use crate::model::user::{Follow, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum SocialError {
    UserNotFound(String),
    SelfFollow,
    AlreadyFollowing(String),
    Repo(RepoError),
}

impl Display for SocialError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserNotFound(username) => write!(f, "user not found: `{username}`"),
            Self::SelfFollow => write!(f, "you cannot follow yourself"),
            Self::AlreadyFollowing(username) => write!(f, "already following `{username}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SocialError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for SocialError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct SocialService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> SocialService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn follow(&self, follower_id: UserId, username: &str) -> Result<Follow, SocialError> {
        let target = self.resolve(username)?;
        if target.id == follower_id {
            return Err(SocialError::SelfFollow);
        }
        match self.repo.follow(follower_id, target.id) {
            Ok(edge) => Ok(edge),
            Err(RepoError::Conflict(_)) => Err(SocialError::AlreadyFollowing(target.username)),
            Err(err) => Err(err.into()),
        }
    }

    /// Returns `false` when no edge existed.
    pub fn unfollow(&self, follower_id: UserId, username: &str) -> Result<bool, SocialError> {
        let target = self.resolve(username)?;
        Ok(self.repo.unfollow(follower_id, target.id)?)
    }

    pub fn followers(&self, user_id: UserId) -> Result<Vec<User>, SocialError> {
        Ok(self.repo.list_followers(user_id)?)
    }

    pub fn following(&self, user_id: UserId) -> Result<Vec<User>, SocialError> {
        Ok(self.repo.list_following(user_id)?)
    }

    fn resolve(&self, username: &str) -> Result<User, SocialError> {
        self.repo
            .find_by_username(username)?
            .ok_or_else(|| SocialError::UserNotFound(username.trim().to_lowercase()))
    }
}
