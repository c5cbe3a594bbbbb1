//! User roles and the capability table

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::{WorkflowError, WorkflowResult};

/// Role carried by every authenticated actor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Inventory administrator
    Admin,
    Manager,
    /// Warehouse operator who hands stock out
    Operator,
    /// Employee raising requests for items
    #[serde(alias = "karyawan")]
    Employee,
}

/// Something an actor can be allowed to do
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Approve or reject item requests
    DecideRequests,
    /// Approve, reject, edit and delete inbound movements
    ManageInbound,
    /// Turn approved requests into outbound movements
    FulfillRequests,
    /// Record outbound movements directly
    RecordOutbound,
    /// Create, edit and delete catalogue items
    ManageItems,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Operator, Role::Employee];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Operator => "operator",
            Role::Employee => "employee",
        }
    }

    /// Capabilities granted to this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Admin => &[
                Capability::DecideRequests,
                Capability::ManageInbound,
                Capability::ManageItems,
            ],
            Role::Manager => &[Capability::DecideRequests],
            Role::Operator => &[Capability::FulfillRequests, Capability::RecordOutbound],
            Role::Employee => &[],
        }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }

    /// Single authorization check invoked at the top of each workflow operation
    pub fn require(&self, capability: Capability) -> WorkflowResult<()> {
        if self.can(capability) {
            Ok(())
        } else {
            Err(WorkflowError::Forbidden {
                role: *self,
                capability,
            })
        }
    }

    /// Roles holding the given capability
    pub fn holders(capability: Capability) -> Vec<Role> {
        Role::ALL.into_iter().filter(|r| r.can(capability)).collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "operator" => Ok(Role::Operator),
            "employee" | "karyawan" => Ok(Role::Employee),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::DecideRequests => "decide item requests",
            Capability::ManageInbound => "manage inbound movements",
            Capability::FulfillRequests => "fulfill item requests",
            Capability::RecordOutbound => "record outbound movements",
            Capability::ManageItems => "manage items",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
