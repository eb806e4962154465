use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Customer,
    Organizer,
    Admin,
}

/// What a role is allowed to do. Resolved once per request from the
/// authenticated role instead of comparing role strings in handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    BookEvents,
    ManageBookings,
    VerifyTickets,
    ViewAllEvents,
}

impl Role {
    pub fn has_capability(self, capability: Capability) -> bool {
        match capability {
            Capability::BookEvents => matches!(self, Role::Customer),
            Capability::ManageBookings | Capability::VerifyTickets => {
                matches!(self, Role::Organizer | Role::Admin)
            }
            Capability::ViewAllEvents => matches!(self, Role::Admin),
        }
    }
}

// The user a request acts on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Actor { user_id, role }
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.role.has_capability(capability)
    }

    /// Organizers may only act on events they organize, holders of
    /// `ViewAllEvents` may act on any event.
    pub fn can_manage_event(&self, organizer_id: i64) -> bool {
        self.can(Capability::ViewAllEvents) || self.user_id == organizer_id
    }
}
