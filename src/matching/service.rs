use tracing::info;

use crate::error::ApiError;
use crate::matching::repo::{MatchRecord, MatchStatus};
use crate::state::AppState;
use crate::users::repo::{User, UserRole};

/// Mentee asks a mentor for a match. At most one pending request may exist
/// per mentee; the store enforces this atomically at creation, the explicit
/// check up front only fixes the error precedence over a missing mentor.
pub async fn request_match(
    state: &AppState,
    actor: &User,
    mentor_email: &str,
    message: &str,
) -> Result<MatchRecord, ApiError> {
    actor.require_role(UserRole::Mentee)?;

    if state.matches.has_pending(&actor.email).await? {
        return Err(ApiError::DuplicatePending);
    }

    match state.users.find(mentor_email).await? {
        Some(target) if target.role == UserRole::Mentor => {}
        _ => return Err(ApiError::NotFound(format!("no mentor {mentor_email}"))),
    }

    let record = state
        .matches
        .create_pending(&actor.email, mentor_email, message)
        .await?;
    info!(mentee = %record.mentee_email, mentor = %record.mentor_email, "match requested");
    Ok(record)
}

/// Mentors see requests addressed to them, mentees their own, resolved
/// history included.
pub async fn list_requests(state: &AppState, actor: &User) -> Result<Vec<MatchRecord>, ApiError> {
    match actor.role {
        UserRole::Mentor => state.matches.list_for_mentor(&actor.email).await,
        UserRole::Mentee => state.matches.list_for_mentee(&actor.email).await,
    }
}

/// Mentor accepts or rejects a pending request addressed to them. The
/// transition is terminal.
pub async fn respond(
    state: &AppState,
    actor: &User,
    mentee_email: &str,
    accept: bool,
) -> Result<MatchRecord, ApiError> {
    actor.require_role(UserRole::Mentor)?;

    let status = if accept {
        MatchStatus::Accepted
    } else {
        MatchStatus::Rejected
    };
    let record = state
        .matches
        .resolve(mentee_email, &actor.email, status)
        .await?;
    info!(
        mentee = %record.mentee_email,
        mentor = %record.mentor_email,
        status = record.status.as_str(),
        "match resolved"
    );
    Ok(record)
}

/// Mentee withdraws their pending request. Resolved requests cannot be
/// cancelled.
pub async fn cancel(state: &AppState, actor: &User) -> Result<(), ApiError> {
    actor.require_role(UserRole::Mentee)?;
    state.matches.delete_pending(&actor.email).await?;
    info!(mentee = %actor.email, "match request cancelled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::users::repo::NewUser;

    async fn add_user(state: &AppState, email: &str, role: UserRole) -> User {
        state
            .users
            .create(NewUser {
                email: email.into(),
                password_hash: "hash".into(),
                name: email.split('@').next().unwrap().into(),
                role,
                bio: String::new(),
                tech_stack: String::new(),
            })
            .await
            .expect("create user")
    }

    async fn setup() -> (AppState, User, User) {
        let state = AppState::in_memory();
        let mentee = add_user(&state, "mentee@x.com", UserRole::Mentee).await;
        let mentor = add_user(&state, "mentor@x.com", UserRole::Mentor).await;
        (state, mentee, mentor)
    }

    #[tokio::test]
    async fn request_creates_pending_record() {
        let (state, mentee, mentor) = setup().await;
        let record = request_match(&state, &mentee, &mentor.email, "hello")
            .await
            .unwrap();
        assert_eq!(record.status, MatchStatus::Pending);
        assert_eq!(record.mentee_email, mentee.email);
        assert_eq!(record.mentor_email, mentor.email);
        assert_eq!(record.message, "hello");
    }

    #[tokio::test]
    async fn mentor_cannot_request_a_match() {
        let (state, _, mentor) = setup().await;
        let err = request_match(&state, &mentor, "mentee@x.com", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn request_to_unknown_or_non_mentor_target_fails() {
        let (state, mentee, _) = setup().await;
        let err = request_match(&state, &mentee, "ghost@x.com", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let other_mentee = add_user(&state, "peer@x.com", UserRole::Mentee).await;
        let err = request_match(&state, &mentee, &other_mentee.email, "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn second_request_while_pending_fails_regardless_of_target() {
        let (state, mentee, mentor) = setup().await;
        let other = add_user(&state, "mentor2@x.com", UserRole::Mentor).await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();
        let err = request_match(&state, &mentee, &other.email, "hi too")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicatePending));
    }

    #[tokio::test]
    async fn duplicate_pending_wins_over_unknown_mentor() {
        let (state, mentee, mentor) = setup().await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();
        let err = request_match(&state, &mentee, "ghost@x.com", "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicatePending));
    }

    #[tokio::test]
    async fn respond_accept_and_reject_are_terminal() {
        let (state, mentee, mentor) = setup().await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();

        let record = respond(&state, &mentor, &mentee.email, true).await.unwrap();
        assert_eq!(record.status, MatchStatus::Accepted);

        // Second respond must fail regardless of the accept value.
        let err = respond(&state, &mentor, &mentee.email, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState));
        let err = respond(&state, &mentor, &mentee.email, true)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidState));
    }

    #[tokio::test]
    async fn only_the_addressed_mentor_can_respond() {
        let (state, mentee, mentor) = setup().await;
        let other = add_user(&state, "mentor2@x.com", UserRole::Mentor).await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();

        let err = respond(&state, &other, &mentee.email, true).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = respond(&state, &mentee, &mentee.email, true).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn cancel_deletes_pending_and_only_pending() {
        let (state, mentee, mentor) = setup().await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();
        cancel(&state, &mentee).await.unwrap();
        assert!(list_requests(&state, &mentee).await.unwrap().is_empty());

        // Nothing pending anymore.
        let err = cancel(&state, &mentee).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // Resolved records are not cancellable either.
        request_match(&state, &mentee, &mentor.email, "again")
            .await
            .unwrap();
        respond(&state, &mentor, &mentee.email, true).await.unwrap();
        let err = cancel(&state, &mentee).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(list_requests(&state, &mentee).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn mentor_cannot_cancel() {
        let (state, _, mentor) = setup().await;
        let err = cancel(&state, &mentor).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn listing_is_scoped_by_role() {
        let (state, mentee, mentor) = setup().await;
        let other_mentee = add_user(&state, "peer@x.com", UserRole::Mentee).await;
        request_match(&state, &mentee, &mentor.email, "one")
            .await
            .unwrap();
        request_match(&state, &other_mentee, &mentor.email, "two")
            .await
            .unwrap();

        assert_eq!(list_requests(&state, &mentor).await.unwrap().len(), 2);
        assert_eq!(list_requests(&state, &mentee).await.unwrap().len(), 1);
        assert_eq!(list_requests(&state, &other_mentee).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn resolved_history_unblocks_new_requests() {
        // Scenario: A requests B, B rejects, A requests C, then a request to
        // D while C is pending fails.
        let state = AppState::in_memory();
        let a = add_user(&state, "a@x.com", UserRole::Mentee).await;
        let b = add_user(&state, "b@x.com", UserRole::Mentor).await;
        let c = add_user(&state, "c@x.com", UserRole::Mentor).await;
        let d = add_user(&state, "d@x.com", UserRole::Mentor).await;

        request_match(&state, &a, &b.email, "hello").await.unwrap();
        let record = respond(&state, &b, &a.email, false).await.unwrap();
        assert_eq!(record.status, MatchStatus::Rejected);

        request_match(&state, &a, &c.email, "hello again")
            .await
            .unwrap();
        let err = request_match(&state, &a, &d.email, "one more")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::DuplicatePending));

        // Invariant: never more than one pending record for the mentee.
        let pending = list_requests(&state, &a)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.status == MatchStatus::Pending)
            .count();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn concurrent_requests_yield_exactly_one_pending() {
        let (state, mentee, mentor) = setup().await;
        let other = add_user(&state, "mentor2@x.com", UserRole::Mentor).await;

        let (r1, r2) = tokio::join!(
            request_match(&state, &mentee, &mentor.email, "first"),
            request_match(&state, &mentee, &other.email, "second"),
        );
        assert!(r1.is_ok() ^ r2.is_ok());

        let pending = list_requests(&state, &mentee)
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.status == MatchStatus::Pending)
            .count();
        assert_eq!(pending, 1);
    }

    #[tokio::test]
    async fn concurrent_responses_yield_exactly_one_transition() {
        let (state, mentee, mentor) = setup().await;
        request_match(&state, &mentee, &mentor.email, "hi")
            .await
            .unwrap();

        let (r1, r2) = tokio::join!(
            respond(&state, &mentor, &mentee.email, true),
            respond(&state, &mentor, &mentee.email, false),
        );
        assert!(r1.is_ok() ^ r2.is_ok());
        let loser = if r1.is_err() { r1 } else { r2 };
        assert!(matches!(loser.unwrap_err(), ApiError::InvalidState));
    }
}
