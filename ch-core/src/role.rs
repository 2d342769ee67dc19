//! Course roles and the capabilities each one carries.
//!
//! Roles arrive from the hosting framework as strings. They are parsed once
//! into [`Role`] and every permission decision goes through a named capability
//! method, so a misspelled role name can never silently grant or revoke access.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A viewer's role within a course.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Role {
    Student,
    /// Lab assistant.
    La,
    /// Student lab assistant: enrolled student who also works the queue.
    Sla,
    Ta,
    /// Undergraduate TA.
    Uta,
    Admin,
    Instructor,
    /// Any role name this crate does not recognise. Carries no capabilities.
    Other(String),
}

impl Role {
    /// Staff see staff-only broadcasts.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::La | Role::Ta | Role::Uta | Role::Admin | Role::Instructor)
    }

    /// May post broadcast messages and read the broadcast history.
    pub fn can_broadcast(&self) -> bool {
        matches!(self, Role::Ta | Role::Admin | Role::Instructor)
    }

    /// May publish a remote-queue meeting URL.
    pub fn can_publish_remote_url(&self) -> bool {
        self.is_staff()
    }

    /// Loads the full staff queue view by default. Instructors are not
    /// queue staff and get the student view.
    pub fn can_view_staff_queue(&self) -> bool {
        matches!(self, Role::La | Role::Ta | Role::Uta | Role::Admin)
    }

    /// Loads the student view by default but may switch to the staff view.
    pub fn is_student_staff(&self) -> bool {
        matches!(self, Role::Sla)
    }

    /// Gets the broadcast poller injected into rendered pages.
    pub fn receives_broadcasts(&self) -> bool {
        self.is_staff() || matches!(self, Role::Student)
    }

    /// Canonical role name as used by the hosting framework.
    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "Student",
            Role::La => "LA",
            Role::Sla => "SLA",
            Role::Ta => "TA",
            Role::Uta => "UTA",
            Role::Admin => "Admin",
            Role::Instructor => "Instructor",
            Role::Other(name) => name,
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "Student" => Role::Student,
            "LA" => Role::La,
            "SLA" => Role::Sla,
            "TA" => Role::Ta,
            "UTA" => Role::Uta,
            "Admin" => Role::Admin,
            "Instructor" => Role::Instructor,
            other => Role::Other(other.to_string()),
        })
    }
}

impl From<&str> for Role {
    fn from(s: &str) -> Self {
        match s.parse() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        Role::from(s.as_str())
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(s: &str) -> Role {
        Role::from(s.to_string())
    }

    #[test]
    fn test_parse_known_roles() {
        assert_eq!(role("TA"), Role::Ta);
        assert_eq!(role("SLA"), Role::Sla);
        assert_eq!(role(" Instructor "), Role::Instructor);
        assert_eq!(role("ta"), Role::Other("ta".into()));
    }

    #[test]
    fn test_broadcast_capabilities() {
        assert!(role("TA").can_broadcast());
        assert!(role("Admin").can_broadcast());
        assert!(role("Instructor").can_broadcast());
        assert!(!role("LA").can_broadcast());
        assert!(!role("UTA").can_broadcast());
        assert!(!role("Student").can_broadcast());
    }

    #[test]
    fn test_staff_membership() {
        for name in ["LA", "TA", "UTA", "Admin", "Instructor"] {
            assert!(role(name).is_staff(), "{name} should be staff");
        }
        for name in ["Student", "SLA", "Guest"] {
            assert!(!role(name).is_staff(), "{name} should not be staff");
        }
    }

    #[test]
    fn test_staff_queue_roles() {
        for name in ["LA", "TA", "UTA", "Admin"] {
            assert!(role(name).can_view_staff_queue(), "{name} should see the staff queue");
        }
        for name in ["Instructor", "SLA", "Student"] {
            assert!(!role(name).can_view_staff_queue(), "{name} should not see the staff queue");
        }
    }

    #[test]
    fn test_unknown_role_has_no_capabilities() {
        let r = role("Adminn");
        assert!(!r.is_staff());
        assert!(!r.can_broadcast());
        assert!(!r.can_publish_remote_url());
        assert!(!r.can_view_staff_queue());
        assert!(!r.is_student_staff());
        assert!(!r.receives_broadcasts());
    }

    #[test]
    fn test_serde_uses_framework_names() {
        let json = serde_json::to_string(&Role::Uta).unwrap();
        assert_eq!(json, "\"UTA\"");
        let back: Role = serde_json::from_str("\"SLA\"").unwrap();
        assert_eq!(back, Role::Sla);
    }
}
