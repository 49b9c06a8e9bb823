use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{PortalError, Result};
use crate::models::{Role, User};
use crate::storage::{SESSION_KEY, USERS_KEY};
use crate::store::{Store, new_id};
use crate::validation;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

// Demo accounts. Non-production: plain-text passwords, no hashing.
const MOCK_ACCOUNTS: &[(&str, &str, &str, Role, &str)] = &[
    ("1", "admin@placementhub.com", "Admin User", Role::Admin, "admin123"),
    ("2", "student@placementhub.com", "Priya Sharma", Role::Student, "student123"),
    ("3", "employer@placementhub.com", "TechCorp Recruiter", Role::Employer, "employer123"),
    ("4", "officer@placementhub.com", "Rajesh Kumar", Role::PlacementOfficer, "officer123"),
    ("5", "arjun.patel@placementhub.com", "Arjun Patel", Role::Student, "student123"),
    ("6", "hr@datasys.com", "DataSys HR", Role::Employer, "employer123"),
];

/// The fixed demo user list.
pub fn mock_users() -> Vec<User> {
    let created_at = Utc
        .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    MOCK_ACCOUNTS
        .iter()
        .map(|(id, email, name, role, _)| User {
            id: id.to_string(),
            email: email.to_string(),
            full_name: name.to_string(),
            role: *role,
            created_at,
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    PostJob,
    ApplyToJob,
    ReviewApplications,
    ScheduleInterview,
    RecordPlacement,
    ViewPlacementAnalytics,
    ManageProfile,
    ManageUsers,
    SendAnnouncements,
}

impl Permission {
    fn action(&self) -> &'static str {
        match self {
            Permission::PostJob => "post jobs",
            Permission::ApplyToJob => "apply to jobs",
            Permission::ReviewApplications => "review applications",
            Permission::ScheduleInterview => "schedule interviews",
            Permission::RecordPlacement => "record placements",
            Permission::ViewPlacementAnalytics => "view placement analytics",
            Permission::ManageProfile => "manage a student profile",
            Permission::ManageUsers => "manage users",
            Permission::SendAnnouncements => "send announcements",
        }
    }
}

impl Role {
    pub fn allows(&self, permission: Permission) -> bool {
        use Permission::*;
        match self {
            Role::Admin => !matches!(permission, ApplyToJob | ManageProfile),
            Role::Student => matches!(permission, ApplyToJob | ManageProfile),
            Role::Employer => matches!(permission, PostJob | ReviewApplications | ScheduleInterview),
            Role::PlacementOfficer => matches!(
                permission,
                ReviewApplications
                    | ScheduleInterview
                    | RecordPlacement
                    | ViewPlacementAnalytics
                    | SendAnnouncements
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    fn issue(user: User, now: DateTime<Utc>, ttl: chrono::Duration) -> Result<Self> {
        let expires_at = now
            .checked_add_signed(ttl)
            .filter(|at| *at > now)
            .ok_or_else(|| {
                PortalError::Validation(format!(
                    "session lifetime of {} minutes is out of range",
                    ttl.num_minutes()
                ))
            })?;
        Ok(Self {
            user,
            access_token: format!("mock-token-{}", new_id()),
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn role(&self) -> Role {
        self.user.role
    }

    pub fn require(&self, permission: Permission) -> Result<()> {
        if self.user.role.allows(permission) {
            Ok(())
        } else {
            warn!(user_id = %self.user.id, "Denied: {}", permission.action());
            Err(PortalError::Forbidden {
                role: self.user.role,
                action: permission.action().to_string(),
            })
        }
    }

    /// Owners act on their own records; admins act on anyone's.
    pub fn require_owner(&self, owner_id: &str, action: &str) -> Result<()> {
        if self.user.id == owner_id || self.user.role == Role::Admin {
            Ok(())
        } else {
            Err(PortalError::Forbidden {
                role: self.user.role,
                action: format!("{} owned by another user", action),
            })
        }
    }
}

#[derive(Debug, Clone)]
pub struct SignUpForm {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub role: Role,
}

impl Store {
    pub fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.sign_in_at(email, password, Utc::now())
    }

    pub fn sign_in_at(&self, email: &str, password: &str, now: DateTime<Utc>) -> Result<Session> {
        let email = email.trim();
        let account = MOCK_ACCOUNTS
            .iter()
            .find(|(_, e, _, _, p)| *e == email && *p == password);
        let Some((id, ..)) = account else {
            warn!("Failed sign-in for {email}");
            return Err(PortalError::InvalidCredentials);
        };

        let user = mock_users()
            .into_iter()
            .find(|u| u.id == *id)
            .ok_or(PortalError::InvalidCredentials)?;
        let session = Session::issue(user, now, self.session_ttl())?;
        self.write_json(SESSION_KEY, &session)?;
        info!(user_id = %session.user.id, "Signed in as {}", session.user.role);
        Ok(session)
    }

    /// Creates a session for a fabricated user. The password only has to pass
    /// validation; it is never stored, so the account cannot sign in again.
    pub fn sign_up(&self, form: SignUpForm) -> Result<Session> {
        let problems = validation::validate_sign_up(&form);
        if !problems.is_empty() {
            return Err(PortalError::Validation(problems.join("; ")));
        }
        if form.role == Role::Admin {
            return Err(PortalError::Validation(
                "admin accounts cannot be self-registered".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: new_id(),
            email: form.email.trim().to_string(),
            full_name: form.full_name.trim().to_string(),
            role: form.role,
            created_at: now,
        };

        let session = Session::issue(user, now, self.session_ttl())?;
        let mut registered = self.registered_users()?;
        registered.push(session.user.clone());
        self.write_json(USERS_KEY, &registered)?;

        self.write_json(SESSION_KEY, &session)?;
        info!(user_id = %session.user.id, "Registered new {} account", session.user.role);
        Ok(session)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.remove_key(SESSION_KEY)?;
        info!("Signed out");
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<Session>> {
        self.current_session_at(Utc::now())
    }

    /// The stored session, or `None` once it has expired (the key is removed).
    pub fn current_session_at(&self, now: DateTime<Utc>) -> Result<Option<Session>> {
        let Some(session) = self.read_json::<Session>(SESSION_KEY)? else {
            return Ok(None);
        };
        if session.is_expired_at(now) {
            info!(user_id = %session.user.id, "Session expired");
            self.remove_key(SESSION_KEY)?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    pub fn require_session(&self) -> Result<Session> {
        self.current_session()?.ok_or(PortalError::NotSignedIn)
    }

    /// Users created through sign-up.
    pub fn registered_users(&self) -> Result<Vec<User>> {
        Ok(self.read_json(USERS_KEY)?.unwrap_or_default())
    }

    /// Demo accounts followed by registered users.
    pub fn all_users(&self) -> Result<Vec<User>> {
        let mut users = mock_users();
        users.extend(self.registered_users()?);
        Ok(users)
    }

    pub fn find_user(&self, id_or_email: &str) -> Result<Option<User>> {
        let needle = id_or_email.trim();
        Ok(self
            .all_users()?
            .into_iter()
            .find(|u| u.id == needle || u.email.eq_ignore_ascii_case(needle)))
    }
}
