use crate::TeamError;
use crate::teams::{MemberContext, TeamAction, TeamMemberRepository, can_execute_team_action};

/// Loads the actor's membership and checks `action` against their role.
///
/// `TeamNotFound` when the actor is not a member, `Forbidden` when the role
/// does not allow the action.
pub(crate) async fn require_team_action<S>(
    store: &S,
    team_id: i64,
    actor_id: i64,
    action: TeamAction,
) -> Result<MemberContext, TeamError>
where
    S: TeamMemberRepository + ?Sized,
{
    let context = store
        .find_member_context(team_id, actor_id)
        .await?
        .ok_or(TeamError::TeamNotFound)?;

    if !can_execute_team_action(action, context.member.role) {
        return Err(TeamError::Forbidden);
    }

    Ok(context)
}

/// Like [`require_team_action`] but reports an insufficient role as
/// `TeamNotFound`, so callers learn nothing about teams they cannot manage.
pub(crate) async fn find_team_for_action<S>(
    store: &S,
    team_id: i64,
    actor_id: i64,
    action: TeamAction,
) -> Result<MemberContext, TeamError>
where
    S: TeamMemberRepository + ?Sized,
{
    match require_team_action(store, team_id, actor_id, action).await {
        Err(TeamError::Forbidden) => Err(TeamError::TeamNotFound),
        other => other,
    }
}
