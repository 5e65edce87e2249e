#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Hr = 2,
    Employee = 3,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Hr),
            3 => Some(Role::Employee),
            _ => None,
        }
    }

    /// Admin and HR may decide pending requests.
    pub fn is_approver(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

/// The viewer performing an operation: role plus the linked employee record,
/// if any. Mirrors the session principal the screens already hold.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: u64,
    pub role: Role,
    /// Present only if this user is linked to an employee record.
    pub employee_id: Option<u64>,
}

impl Actor {
    pub fn approver(user_id: u64) -> Self {
        Actor {
            user_id,
            role: Role::Hr,
            employee_id: None,
        }
    }

    pub fn submitter(user_id: u64, employee_id: u64) -> Self {
        Actor {
            user_id,
            role: Role::Employee,
            employee_id: Some(employee_id),
        }
    }
}
