//! The quest lifecycle as a single transition table.
//!
//! ```text
//!   publish ──► OPEN ──accept──► LOCKED ──submit──► PENDING_REVIEW ──complete──► COMPLETED
//!                 ▲                 │
//!                 └──────drop───────┘
//!   OPEN   ──cancel──────► (deleted)
//!   LOCKED ──force-cancel► (deleted)
//! ```
//!
//! Every action has exactly one source state. The store applies a transition
//! as one conditional update on `(id, from, actor)`, and [`check`] explains
//! afterwards why a rejected update did not match.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::QuestStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Accept,
    Drop,
    Submit,
    Complete,
    Cancel,
    /// Publisher deletes a quest that already has a provider. The provider
    /// loses the match without being asked.
    ForceCancel,
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRule {
    /// Any authenticated user except the quest's publisher.
    AnyoneButPublisher,
    Publisher,
    /// The provider currently assigned to the quest.
    Provider,
}

/// Where a transition leads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Status(QuestStatus),
    Deleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: Action,
    pub from: QuestStatus,
    pub actor: ActorRule,
    pub to: Target,
}

/// Why an action cannot be applied to a quest as it currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Forbidden,
    WrongState {
        expected: QuestStatus,
        actual: QuestStatus,
    },
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Accept,
        Action::Drop,
        Action::Submit,
        Action::Complete,
        Action::Cancel,
        Action::ForceCancel,
    ];

    pub fn transition(self) -> Transition {
        use QuestStatus::*;

        let (from, actor, to) = match self {
            Self::Accept => (Open, ActorRule::AnyoneButPublisher, Target::Status(Locked)),
            Self::Drop => (Locked, ActorRule::Provider, Target::Status(Open)),
            Self::Submit => (Locked, ActorRule::Provider, Target::Status(PendingReview)),
            Self::Complete => (PendingReview, ActorRule::Publisher, Target::Status(Completed)),
            Self::Cancel => (Open, ActorRule::Publisher, Target::Deleted),
            Self::ForceCancel => (Locked, ActorRule::Publisher, Target::Deleted),
        };

        Transition {
            action: self,
            from,
            actor,
            to,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::Drop => "drop",
            Self::Submit => "submit",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
            Self::ForceCancel => "force-cancel",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl ActorRule {
    pub fn permits(self, actor: &str, publisher: &str, provider: Option<&str>) -> bool {
        match self {
            Self::AnyoneButPublisher => actor != publisher,
            Self::Publisher => actor == publisher,
            Self::Provider => provider == Some(actor),
        }
    }
}

/// Actions available from `status`, in table order.
pub fn actions_from(status: QuestStatus) -> Vec<Action> {
    Action::ALL
        .into_iter()
        .filter(|a| a.transition().from == status)
        .collect()
}

/// Decides whether `actor` may apply `action` to a quest in `status`.
///
/// Publisher-bound rules are judged before the state because the publisher
/// never changes; provider-bound rules after it, because there is no provider
/// to compare against while the quest is open.
pub fn check(
    action: Action,
    status: QuestStatus,
    actor: &str,
    publisher: &str,
    provider: Option<&str>,
) -> Result<Transition, Rejection> {
    let t = action.transition();

    let permitted = t.actor.permits(actor, publisher, provider);
    match t.actor {
        ActorRule::Publisher | ActorRule::AnyoneButPublisher if !permitted => {
            return Err(Rejection::Forbidden);
        }
        _ => {}
    }

    if status != t.from {
        return Err(Rejection::WrongState {
            expected: t.from,
            actual: status,
        });
    }

    if !permitted {
        return Err(Rejection::Forbidden);
    }

    Ok(t)
}
