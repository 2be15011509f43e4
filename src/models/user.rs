use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Role carried by every account.
///
/// Parsing is forgiving about spelling and case, but anything it does not
/// recognise (including a missing field) lands on [`Role::Unknown`], which
/// every scoping rule treats as "sees nothing".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Role {
    Admin,
    TeamLeader,
    Manager,
    Employee,
    Client,
    #[default]
    Unknown,
}

impl Role {
    pub fn parse(raw: &str) -> Self {
        let normalized: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "admin" => Role::Admin,
            "teamleader" | "groupleader" | "leader" => Role::TeamLeader,
            "manager" => Role::Manager,
            "employee" => Role::Employee,
            "client" => Role::Client,
            _ => Role::Unknown,
        }
    }

    /// Roles listed on the employee roster.
    pub fn is_rostered(self) -> bool {
        matches!(self, Role::Employee | Role::Manager | Role::TeamLeader)
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Role::parse).unwrap_or_default())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "Admin",
            Role::TeamLeader => "TeamLeader",
            Role::Manager => "Manager",
            Role::Employee => "Employee",
            Role::Client => "Client",
            Role::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Name of a group as stored on each member.
///
/// Membership is a plain string comparison between `user.team` and the
/// group's name, so a rename must rewrite every member in the same pass
/// (see `Storage::rename_group`) or the old members are orphaned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupName(String);

impl GroupName {
    /// Returns `None` for blank input; an empty team is "no team".
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(GroupName(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deserializes an optional team, mapping `""` and `null` to `None`.
pub fn deserialize_team<'de, D>(deserializer: D) -> Result<Option<GroupName>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(GroupName::new))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "deserialize_team")]
    pub team: Option<GroupName>,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>, role: Role) -> Self {
        User {
            id: id.into(),
            name: name.into(),
            email: String::new(),
            role,
            team: None,
            avatar: None,
        }
    }

    pub fn with_team(mut self, team: &str) -> Self {
        self.team = GroupName::new(team);
        self
    }

    pub fn with_email(mut self, email: &str) -> Self {
        self.email = email.to_string();
        self
    }

    pub fn belongs_to(&self, group: &GroupName) -> bool {
        self.team.as_ref() == Some(group)
    }

    /// Avatar initials, derived from the name when none are stored.
    pub fn initials(&self) -> String {
        if let Some(avatar) = self.avatar.as_deref().filter(|a| !a.trim().is_empty()) {
            return avatar.to_string();
        }
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .flat_map(char::to_uppercase)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub role: Option<Role>,
    /// `Some("")` clears the team.
    pub team: Option<String>,
}
