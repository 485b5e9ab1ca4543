use tracing::info;

use crate::auth::password::hash_password;
use crate::error::ApiError;
use crate::state::AppState;
use crate::users::repo::{NewUser, UserRole};

/// Insert demo accounts for manual testing. Safe to call repeatedly.
pub async fn seed_demo_users(state: &AppState) -> anyhow::Result<()> {
    let demo = [
        (
            "mentor@test.com",
            "mentor1234",
            "Demo Mentor",
            UserRole::Mentor,
            "Happy to help you get started.",
            "Rust, Axum",
        ),
        (
            "mentee@test.com",
            "mentee1234",
            "Demo Mentee",
            UserRole::Mentee,
            "Learning backend development.",
            "React, Vite",
        ),
    ];

    for (email, password, name, role, bio, tech_stack) in demo {
        let new_user = NewUser {
            email: email.into(),
            password_hash: hash_password(password)?,
            name: name.into(),
            role,
            bio: bio.into(),
            tech_stack: tech_stack.into(),
        };
        match state.users.create(new_user).await {
            Ok(_) => info!(email, "seeded demo user"),
            Err(ApiError::DuplicateIdentity) => {}
            Err(e) => return Err(anyhow::anyhow!("seed {email}: {e}")),
        }
    }
    Ok(())
}
