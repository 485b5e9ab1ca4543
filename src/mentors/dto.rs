use serde::{Deserialize, Serialize};

use crate::users::repo::User;

#[derive(Debug, Deserialize)]
pub struct MentorQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MentorSummary {
    pub email: String,
    pub name: String,
    pub bio: String,
    pub tech_stack: String,
}

impl From<User> for MentorSummary {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
            bio: u.bio,
            tech_stack: u.tech_stack,
        }
    }
}
