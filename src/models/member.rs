//! Member model, JWT claims and capability checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::error::AppError;

/// Member roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Member,
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Member => "MEMBER",
            Role::Admin => "ADMIN",
            Role::SuperAdmin => "SUPERADMIN",
        }
    }

    /// Admins and superadmins manage inventory, policy and other members' loans
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "MEMBER" => Ok(Role::Member),
            "ADMIN" => Ok(Role::Admin),
            "SUPERADMIN" => Ok(Role::SuperAdmin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

// SQLx conversion for Role (stored as VARCHAR)
impl sqlx::Type<Postgres> for Role {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for Role {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for Role {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Member row from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Operations guarded at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Borrow, return, renew or list loans on behalf of the given member
    ActForMember(i32),
    ManageInventory,
    ManagePolicy,
    ViewSystemDashboard,
}

/// Scope of a dashboard request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardScope {
    System,
    Member(i32),
}

/// JWT claims for authenticated members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberClaims {
    pub sub: String,
    pub member_id: i32,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl MemberClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ActForMember(id) => self.member_id == id || self.role.is_staff(),
            Capability::ManageInventory
            | Capability::ManagePolicy
            | Capability::ViewSystemDashboard => self.role.is_staff(),
        }
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.allows(capability) {
            Ok(())
        } else {
            let what = match capability {
                Capability::ActForMember(_) => "act for another member",
                Capability::ManageInventory => "manage inventory",
                Capability::ManagePolicy => "manage the lending policy",
                Capability::ViewSystemDashboard => "view the system dashboard",
            };
            Err(AppError::Authorization(format!("Insufficient rights to {}", what)))
        }
    }

    /// Staff see the whole library, members only their own loans
    pub fn dashboard_scope(&self) -> DashboardScope {
        if self.allows(Capability::ViewSystemDashboard) {
            DashboardScope::System
        } else {
            DashboardScope::Member(self.member_id)
        }
    }
}
