//! Authentication Models
//! Mission: Define user, claims and auth request/response structures

use serde::{Deserialize, Serialize};

/// Stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: String,
}

impl User {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Identity facts handed to the token service after credentials check out
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: i64,
    pub email: String,
    pub name: String,
}

/// JWT Claims payload
///
/// The payload is only integrity-protected, anyone holding the token can
/// read it. Never put secrets here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub iat: i64, // issued at, seconds since epoch
    pub exp: i64, // expiration, seconds since epoch
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public projection of a user (no hash, no timestamps)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl PublicUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
        }
    }
}

/// Dashboard response - echoes the verified claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub message: String,
    pub user: Claims,
}

/// Profile update body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
}

/// Profile update response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: PublicUser,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_user() -> User {
        User {
            id: 7,
            name: "Sita".to_string(),
            email: "sita@ku.edu.np".to_string(),
            password_hash: "$2b$04$secret".to_string(),
            created_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&create_test_user()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("$2b$04$secret"));
    }

    #[test]
    fn test_public_user_projection() {
        let user = create_test_user();
        let public = PublicUser::from_user(&user);
        assert_eq!(public.id, 7);
        assert_eq!(public.name, "Sita");
        assert_eq!(public.email, "sita@ku.edu.np");

        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 3);
    }

    #[test]
    fn test_claims_identity_matches_user() {
        let user = create_test_user();
        let claims = Claims {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            iat: 1_700_000_000,
            exp: 1_700_086_400,
        };
        assert_eq!(claims.identity(), user.identity());
    }
}
