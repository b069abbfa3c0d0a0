#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Admin = 1,
    Teacher = 2,
    Staff = 3,
    Student = 4,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Teacher),
            3 => Some(Role::Staff),
            4 => Some(Role::Student),
            _ => None,
        }
    }
}
