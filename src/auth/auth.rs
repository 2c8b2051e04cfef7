use crate::error::ApiError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

/// The authenticated account, as placed in request extensions by the gate
/// middleware. Never carries the password hash.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Populated by auth_middleware; absent only on unprotected routes.
        let user = req.extensions().get::<CurrentUser>().cloned();
        ready(user.ok_or_else(|| ApiError::Unauthenticated.into()))
    }
}

impl CurrentUser {
    pub fn require_student(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Student => Ok(()),
            Role::Faculty | Role::Admin => {
                Err(ApiError::Forbidden("Access denied: Students only"))
            }
        }
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Student | Role::Faculty => Err(ApiError::Forbidden("Access denied: Admin only")),
        }
    }

    pub fn require_faculty(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Faculty => Ok(()),
            Role::Student | Role::Admin => {
                Err(ApiError::Forbidden("Access denied: Faculty only"))
            }
        }
    }

    pub fn require_faculty_or_admin(&self) -> Result<(), ApiError> {
        match self.role {
            Role::Faculty | Role::Admin => Ok(()),
            Role::Student => Err(ApiError::Forbidden("Access denied: Admin/Faculty only")),
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: 1,
            name: "Test User".into(),
            email: "test@college.edu".into(),
            role,
        }
    }

    #[test]
    fn student_guard() {
        assert!(user(Role::Student).require_student().is_ok());
        assert!(user(Role::Faculty).require_student().is_err());
        assert!(user(Role::Admin).require_student().is_err());
    }

    #[test]
    fn admin_guard() {
        assert!(user(Role::Admin).require_admin().is_ok());
        assert!(user(Role::Faculty).require_admin().is_err());
        assert!(user(Role::Student).require_admin().is_err());
    }

    #[test]
    fn faculty_guard() {
        assert!(user(Role::Faculty).require_faculty().is_ok());
        assert!(user(Role::Admin).require_faculty().is_err());
        assert!(user(Role::Student).require_faculty().is_err());
    }

    #[test]
    fn faculty_or_admin_guard() {
        assert!(user(Role::Faculty).require_faculty_or_admin().is_ok());
        assert!(user(Role::Admin).require_faculty_or_admin().is_ok());
        assert!(user(Role::Student).require_faculty_or_admin().is_err());
    }
}
