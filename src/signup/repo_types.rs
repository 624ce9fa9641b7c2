use std::str::FromStr;

use sqlx::FromRow;

/// Stored signup record.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: i64,          // assigned by sqlite, never reused
    pub fullname: String,
    pub email: String,
    pub idnumber: String, // ####-####, unique
    pub role: String,     // Role::as_str()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    Faculty,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "Student",
            Role::Faculty => "Faculty",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Student" => Ok(Role::Student),
            "Faculty" => Ok(Role::Faculty),
            _ => Err(()),
        }
    }
}

/// A validated submission, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub idnumber: String,
    pub role: Role,
}
