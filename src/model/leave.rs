use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Terminal decision on a pending leave request. This is the only status a
/// caller may ask for; `pending` is never a valid target.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LeaveAction {
    Approved,
    Rejected,
}

impl LeaveAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveAction::Approved => "approved",
            LeaveAction::Rejected => "rejected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_string_mapping() {
        assert_eq!(LeaveAction::Approved.as_str(), "approved");
        assert_eq!(LeaveAction::Rejected.as_str(), "rejected");
    }

    #[test]
    fn only_terminal_statuses_deserialize() {
        let ok: LeaveAction = serde_json::from_str("\"approved\"").unwrap();
        assert_eq!(ok, LeaveAction::Approved);
        let ok: LeaveAction = serde_json::from_str("\"rejected\"").unwrap();
        assert_eq!(ok, LeaveAction::Rejected);

        assert!(serde_json::from_str::<LeaveAction>("\"pending\"").is_err());
        assert!(serde_json::from_str::<LeaveAction>("\"cancelled\"").is_err());
        assert!(serde_json::from_str::<LeaveAction>("\"Approved\"").is_err());
    }
}
