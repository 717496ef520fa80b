use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Subscription tier of a company
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Team,
    Ultimate,
}

/// Per-plan limits. `None` means unlimited.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub emails_per_month: Option<i64>,
    pub stages_per_role: Option<i64>,
    pub active_roles: Option<i64>,
}

impl Plan {
    pub fn limits(self) -> PlanLimits {
        match self {
            Plan::Team => PlanLimits {
                emails_per_month: Some(50),
                stages_per_role: Some(4),
                active_roles: Some(5),
            },
            Plan::Ultimate => PlanLimits {
                emails_per_month: None,
                stages_per_role: None,
                active_roles: None,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Plan::Team => "team",
            Plan::Ultimate => "ultimate",
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "team" => Ok(Plan::Team),
            "ultimate" => Ok(Plan::Ultimate),
            other => Err(format!("unknown plan: {}", other)),
        }
    }
}

/// Stage count of a single role, for the usage page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleStageUsage {
    pub role_id: i64,
    pub role_name: String,
    pub stage_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageCounts {
    pub emails_sent_this_month: i64,
    pub active_roles: i64,
    pub stages_per_role: Vec<RoleStageUsage>,
}

/// Read-only usage snapshot of a company against its plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompanyUsage {
    pub plan: Plan,
    pub limits: PlanLimits,
    pub usage: UsageCounts,
}
