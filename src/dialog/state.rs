//! Dialogue state machine — tracks where a conversation is.
//!
//! The collected registration fields live inside the variants, so a later
//! step cannot exist without the earlier answers, and a session can never
//! be mid-onboarding and mid-admin-action at the same time.

/// Admin operation awaiting a target identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminAction {
    Promote,
    Delete,
    Unpromote,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Promote => "promote",
            Self::Delete => "delete",
            Self::Unpromote => "unpromote",
        };
        write!(f, "{s}")
    }
}

/// Where a conversation currently stands.
///
/// Onboarding progresses linearly: Idle → AskFullName → AskEmail →
/// AskPhone → (record created) → Idle. There is no backward navigation.
/// `AwaitTarget` is the admin counterpart: the caller was prompted for a
/// target identity and the next text message answers it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    AskFullName,
    AskEmail {
        full_name: String,
    },
    AskPhone {
        full_name: String,
        email: String,
    },
    AwaitTarget(AdminAction),
}

impl DialogState {
    /// Whether no dialogue is in progress.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short name of the current step, for logging.
    pub fn step_name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AskFullName => "ask_full_name",
            Self::AskEmail { .. } => "ask_email",
            Self::AskPhone { .. } => "ask_phone",
            Self::AwaitTarget(AdminAction::Promote) => "await_promote_target",
            Self::AwaitTarget(AdminAction::Delete) => "await_delete_target",
            Self::AwaitTarget(AdminAction::Unpromote) => "await_unpromote_target",
        }
    }
}

impl std::fmt::Display for DialogState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.step_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_idle() {
        assert!(DialogState::default().is_idle());
        assert!(!DialogState::AskFullName.is_idle());
    }

    #[test]
    fn step_names_are_distinct() {
        let states = [
            DialogState::Idle,
            DialogState::AskFullName,
            DialogState::AskEmail {
                full_name: "Ann".into(),
            },
            DialogState::AskPhone {
                full_name: "Ann".into(),
                email: "ann@example.com".into(),
            },
            DialogState::AwaitTarget(AdminAction::Promote),
            DialogState::AwaitTarget(AdminAction::Delete),
            DialogState::AwaitTarget(AdminAction::Unpromote),
        ];
        let mut names: Vec<&str> = states.iter().map(|s| s.step_name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), states.len());
    }
}
