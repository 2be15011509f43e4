use serde::{Deserialize, Serialize};

use super::user::GroupName;

/// A named group of employees led by a TeamLeader.
///
/// Members are linked by name (`user.team == group.name`), not by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: GroupName,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RenameGroupRequest {
    pub name: String,
}
