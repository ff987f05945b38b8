//! Actors, roles and trust memberships
//!
//! Role compatibility lives in one place: [`ROLE_EQUIVALENCE`]. Every
//! authorization check goes through [`Role::satisfies`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumString};

/// Role of an actor, globally or within a trust
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Role {
    #[serde(rename = "SUPER_ADMIN")]
    #[strum(to_string = "SUPER_ADMIN")]
    SuperAdmin,

    #[serde(rename = "FIDUCIARY", alias = "FIDUCIARIO")]
    #[strum(to_string = "FIDUCIARY", serialize = "FIDUCIARIO")]
    Fiduciary,

    /// Legacy trustee role, equivalent to `Fiduciary`
    #[serde(rename = "TRUSTEE")]
    #[strum(to_string = "TRUSTEE")]
    Trustee,

    #[serde(rename = "COMMITTEE_MEMBER", alias = "COMITE_TECNICO")]
    #[strum(to_string = "COMMITTEE_MEMBER", serialize = "COMITE_TECNICO")]
    CommitteeMember,

    #[serde(rename = "BENEFICIARY", alias = "BENEFICIARIO")]
    #[strum(to_string = "BENEFICIARY", serialize = "BENEFICIARIO")]
    Beneficiary,

    #[serde(rename = "AUDITOR")]
    #[strum(to_string = "AUDITOR")]
    Auditor,

    #[serde(rename = "REGULATOR", alias = "REGULADOR")]
    #[strum(to_string = "REGULATOR", serialize = "REGULADOR")]
    Regulator,
}

/// Required role -> roles accepted in its place
pub const ROLE_EQUIVALENCE: &[(Role, &[Role])] = &[
    (Role::Fiduciary, &[Role::Fiduciary, Role::Trustee]),
    (Role::Trustee, &[Role::Fiduciary, Role::Trustee]),
];

impl Role {
    /// Whether holding `self` meets a requirement for `required`
    pub fn satisfies(&self, required: Role) -> bool {
        if *self == required {
            return true;
        }
        ROLE_EQUIVALENCE
            .iter()
            .find(|(role, _)| *role == required)
            .map(|(_, accepted)| accepted.contains(self))
            .unwrap_or(false)
    }

    pub fn satisfies_any(&self, required: &[Role]) -> bool {
        required.iter().any(|r| self.satisfies(*r))
    }

    pub fn is_trustee(&self) -> bool {
        self.satisfies(Role::Fiduciary)
    }

    pub fn is_committee(&self) -> bool {
        self.satisfies(Role::CommitteeMember)
    }
}

/// A person or institution acting on trusts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub role: Role,
    /// Bypasses trust membership checks, never role checks
    pub is_super_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl Actor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            is_super_admin: role == Role::SuperAdmin,
            role,
            created_at: Utc::now(),
        }
    }

    pub fn with_super_admin(mut self) -> Self {
        self.is_super_admin = true;
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Super admins skip membership lookups
    pub fn bypasses_membership(&self) -> bool {
        self.is_super_admin || self.role == Role::SuperAdmin
    }
}

/// Link between an actor and a trust
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub actor_id: String,
    pub trust_id: String,
    pub role_in_trust: Role,
    pub active: bool,
    pub assigned_at: DateTime<Utc>,
}

impl Membership {
    /// Active membership meeting one of `required`
    pub fn grants(&self, required: &[Role]) -> bool {
        self.active && self.role_in_trust.satisfies_any(required)
    }
}

/// Origin of an action: a human actor or the system itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActorRef {
    Human { actor_id: String },
    System,
}

impl ActorRef {
    pub fn human(actor_id: impl Into<String>) -> Self {
        ActorRef::Human {
            actor_id: actor_id.into(),
        }
    }

    pub fn actor_id(&self) -> Option<&str> {
        match self {
            ActorRef::Human { actor_id } => Some(actor_id),
            ActorRef::System => None,
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorRef::Human { actor_id } => write!(f, "{}", actor_id),
            ActorRef::System => write!(f, "system"),
        }
    }
}
