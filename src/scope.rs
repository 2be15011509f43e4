//! Role-scoped visibility over tasks, clients and the employee roster.
//!
//! Everything here is a pure function over an in-memory snapshot. Missing or
//! unrecognised authorisation data always narrows the result: a null actor,
//! an `Unknown`/`Client` role, or a TeamLeader without a team sees nothing.

use std::collections::HashSet;

use crate::models::{Client, Role, Task, TaskUpdate, User};

/// Scoping rules for one actor against one snapshot of the user table.
///
/// The user table is needed because TeamLeader visibility is derived from
/// the roster of the leader's group.
#[derive(Debug, Clone, Copy)]
pub struct AccessScope<'a> {
    actor: Option<&'a User>,
    users: &'a [User],
}

impl<'a> AccessScope<'a> {
    pub fn new(actor: Option<&'a User>, users: &'a [User]) -> Self {
        AccessScope { actor, users }
    }

    pub fn actor(&self) -> Option<&'a User> {
        self.actor
    }

    pub fn role(&self) -> Role {
        self.actor.map(|actor| actor.role).unwrap_or_default()
    }

    /// Users the actor may browse.
    ///
    /// Admin sees every rostered user (Employee, Manager, TeamLeader);
    /// a TeamLeader sees the rostered users of their own group.
    pub fn scope_employees(&self) -> Vec<User> {
        self.roster().cloned().collect()
    }

    fn roster(&self) -> Box<dyn Iterator<Item = &'a User> + 'a> {
        let users = self.users;
        match self.actor {
            Some(actor) if actor.role == Role::Admin => {
                Box::new(users.iter().filter(|u| u.role.is_rostered()))
            }
            Some(User { role: Role::TeamLeader, team: Some(team), .. }) => Box::new(
                users
                    .iter()
                    .filter(move |u| u.role.is_rostered() && u.belongs_to(team)),
            ),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn roster_ids(&self) -> HashSet<&'a str> {
        self.roster().map(|u| u.id.as_str()).collect()
    }

    fn in_roster(&self, user_id: &str) -> bool {
        self.roster().any(|u| u.id == user_id)
    }

    /// Tasks the actor may see, in snapshot order.
    pub fn scope_tasks(&self, tasks: &[Task]) -> Vec<Task> {
        let Some(actor) = self.actor else {
            return Vec::new();
        };
        match actor.role {
            Role::Admin => tasks.to_vec(),
            Role::TeamLeader => {
                let members = self.roster_ids();
                tasks
                    .iter()
                    .filter(|t| members.contains(t.assignee_id.as_str()))
                    .cloned()
                    .collect()
            }
            Role::Employee | Role::Manager => tasks
                .iter()
                .filter(|t| t.assignee_id == actor.id)
                .cloned()
                .collect(),
            Role::Client | Role::Unknown => Vec::new(),
        }
    }

    /// Clients the actor may see.
    ///
    /// Outside of Admin a client is only visible through at least one visible
    /// task, so `tasks` must come from the same snapshot as `clients`.
    pub fn scope_clients(&self, clients: &[Client], tasks: &[Task]) -> Vec<Client> {
        match self.role() {
            Role::Admin => clients.to_vec(),
            Role::TeamLeader | Role::Employee | Role::Manager => {
                let visible = self.scope_tasks(tasks);
                let referenced: HashSet<&str> =
                    visible.iter().filter_map(|t| t.client_id.as_deref()).collect();
                clients
                    .iter()
                    .filter(|c| referenced.contains(c.id.as_str()))
                    .cloned()
                    .collect()
            }
            Role::Client | Role::Unknown => Vec::new(),
        }
    }

    pub fn can_view_task(&self, task: &Task) -> bool {
        match self.actor {
            Some(actor) => match actor.role {
                Role::Admin => true,
                Role::TeamLeader => self.in_roster(&task.assignee_id),
                Role::Employee | Role::Manager => task.assignee_id == actor.id,
                Role::Client | Role::Unknown => false,
            },
            None => false,
        }
    }

    /// Whether the actor may change the task at all.
    ///
    /// For Employees and Managers this only covers the progress fields; use
    /// [`AccessScope::can_apply_update`] to check a concrete change.
    pub fn can_mutate_task(&self, task: &Task) -> bool {
        self.can_view_task(task)
    }

    pub fn can_apply_update(&self, task: &Task, update: &TaskUpdate) -> bool {
        if !self.can_mutate_task(task) {
            return false;
        }
        match self.role() {
            Role::Admin => true,
            Role::TeamLeader => update
                .reassigns(task)
                .map_or(true, |assignee| self.in_roster(assignee)),
            Role::Employee | Role::Manager => update.touches_only_progress(),
            Role::Client | Role::Unknown => false,
        }
    }

    /// Deleting is reserved to Admin and the assignee's TeamLeader.
    pub fn can_delete_task(&self, task: &Task) -> bool {
        match self.role() {
            Role::Admin => true,
            Role::TeamLeader => self.in_roster(&task.assignee_id),
            _ => false,
        }
    }

    /// Whether the actor may create a task assigned to `assignee_id`.
    pub fn can_create_task(&self, assignee_id: &str) -> bool {
        match self.actor {
            Some(actor) => match actor.role {
                Role::Admin => true,
                Role::TeamLeader => self.in_roster(assignee_id),
                Role::Employee | Role::Manager => assignee_id == actor.id,
                Role::Client | Role::Unknown => false,
            },
            None => false,
        }
    }
}

/// Only an Admin may change roles, and therefore only an Admin may grant Admin.
pub fn can_assign_role(actor: Option<&User>, target: Role) -> bool {
    match actor.map(|a| a.role) {
        Some(Role::Admin) => target != Role::Unknown,
        _ => false,
    }
}
