use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::mentors::dto::{MentorQuery, MentorSummary};
use crate::state::AppState;
use crate::users::repo::User;

pub fn mentor_routes() -> Router<AppState> {
    Router::new().route("/mentors", get(list_mentors))
}

/// Unauthenticated directory listing with optional substring search and
/// ascending sort. Without a sort key, storage order is kept.
#[instrument(skip(state))]
pub async fn list_mentors(
    State(state): State<AppState>,
    Query(params): Query<MentorQuery>,
) -> Result<Json<Vec<MentorSummary>>, ApiError> {
    let mentors = state.users.list_mentors().await?;
    let mentors = filter_and_sort(mentors, params.q.as_deref(), params.sort.as_deref());
    Ok(Json(mentors.into_iter().map(MentorSummary::from).collect()))
}

fn filter_and_sort(mut mentors: Vec<User>, q: Option<&str>, sort: Option<&str>) -> Vec<User> {
    if let Some(q) = q {
        let needle = q.to_lowercase();
        mentors.retain(|m| {
            m.name.to_lowercase().contains(&needle)
                || m.tech_stack.to_lowercase().contains(&needle)
        });
    }
    match sort {
        Some("name") => mentors.sort_by(|a, b| a.name.cmp(&b.name)),
        Some("tech_stack") => mentors.sort_by(|a, b| a.tech_stack.cmp(&b.tech_stack)),
        _ => {}
    }
    mentors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::UserRole;
    use time::OffsetDateTime;

    fn mentor(name: &str, tech_stack: &str) -> User {
        User {
            email: format!("{}@x.com", name.to_lowercase()),
            password_hash: "hash".into(),
            name: name.into(),
            role: UserRole::Mentor,
            bio: String::new(),
            tech_stack: tech_stack.into(),
            profile_image: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn sample() -> Vec<User> {
        vec![
            mentor("Noah", "Go, Kubernetes"),
            mentor("Mia", "Rust, Axum"),
            mentor("Gordon", "Python"),
        ]
    }

    #[test]
    fn search_matches_name_or_tech_stack_case_insensitively() {
        let hits = filter_and_sort(sample(), Some("Go"), None);
        let names: Vec<_> = hits.iter().map(|m| m.name.as_str()).collect();
        // "Go" hits Noah's tech stack and Gordon's name, not Mia.
        assert_eq!(names, ["Noah", "Gordon"]);

        let hits = filter_and_sort(sample(), Some("rust"), None);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Mia");
    }

    #[test]
    fn sort_by_name_and_tech_stack() {
        let sorted = filter_and_sort(sample(), None, Some("name"));
        let names: Vec<_> = sorted.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Gordon", "Mia", "Noah"]);

        let sorted = filter_and_sort(sample(), None, Some("tech_stack"));
        let stacks: Vec<_> = sorted.iter().map(|m| m.tech_stack.as_str()).collect();
        assert_eq!(stacks, ["Go, Kubernetes", "Python", "Rust, Axum"]);
    }

    #[test]
    fn unknown_sort_key_keeps_storage_order() {
        let kept = filter_and_sort(sample(), None, Some("email"));
        let names: Vec<_> = kept.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["Noah", "Mia", "Gordon"]);
    }
}
