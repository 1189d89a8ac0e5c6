use crate::error::AppError;
use crate::model::{Goal, GoalLink, Horizon};

/// Points `goal` at a goal exactly one horizon up. The target is not looked
/// up here; it resolves lazily at read time.
pub fn link_to_parent(
    goal: &mut Goal,
    parent_horizon: Horizon,
    parent_id: &str,
) -> Result<(), AppError> {
    let parent_id = parent_id.trim();
    if parent_id.is_empty() {
        return Err(AppError::InvalidInput(
            "parent goal id cannot be empty".to_string(),
        ));
    }
    match goal.horizon.parent() {
        Some(expected) if expected == parent_horizon => {}
        Some(expected) => {
            return Err(AppError::InvalidInput(format!(
                "{} goals link to {} goals, not {} goals",
                goal.horizon, expected, parent_horizon
            )));
        }
        None => {
            return Err(AppError::InvalidInput(format!(
                "{} goals have no parent horizon",
                goal.horizon
            )));
        }
    }
    if parent_id == goal.id {
        return Err(AppError::InvalidInput(
            "a goal cannot link to itself".to_string(),
        ));
    }
    goal.link = GoalLink::Linked {
        horizon: parent_horizon,
        id: parent_id.to_string(),
    };
    Ok(())
}

pub fn unlink(goal: &mut Goal) {
    goal.link = GoalLink::Unlinked;
}

/// Finds the linked parent among `parent_goals`; a dangling link is simply
/// absent.
pub fn resolve_parent<'a>(goal: &Goal, parent_goals: &'a [Goal]) -> Option<&'a Goal> {
    match &goal.link {
        GoalLink::Linked { horizon, id } => parent_goals
            .iter()
            .find(|candidate| candidate.horizon == *horizon && candidate.id == *id),
        GoalLink::Unlinked => None,
    }
}

pub fn children_of<'a>(parent: &Goal, child_goals: &'a [Goal]) -> Vec<&'a Goal> {
    child_goals
        .iter()
        .filter(|child| match &child.link {
            GoalLink::Linked { horizon, id } => *horizon == parent.horizon && *id == parent.id,
            GoalLink::Unlinked => false,
        })
        .collect()
}
