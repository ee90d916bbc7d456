use serde::{Deserialize, Serialize};

use super::ids::MemberId;

/// Role of a team member on site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    ProjectManager,
    SiteSupervisor,
    Engineer,
    Foreman,
    #[default]
    Worker,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::ProjectManager,
        Role::SiteSupervisor,
        Role::Engineer,
        Role::Foreman,
        Role::Worker,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::ProjectManager => "project-manager",
            Role::SiteSupervisor => "site-supervisor",
            Role::Engineer => "engineer",
            Role::Foreman => "foreman",
            Role::Worker => "worker",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::ProjectManager => "Project Manager",
            Role::SiteSupervisor => "Site Supervisor",
            Role::Engineer => "Engineer",
            Role::Foreman => "Foreman",
            Role::Worker => "Worker",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.as_str() == s.trim())
    }
}

/// A person who can be assigned tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: String,
}

impl TeamMember {
    pub fn new(id: MemberId, name: impl Into<String>) -> Self {
        TeamMember {
            id,
            name: name.into(),
            email: String::new(),
            role: Role::default(),
            phone: String::new(),
        }
    }
}
