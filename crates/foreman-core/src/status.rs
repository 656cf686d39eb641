//! Resource status vocabulary and lifecycle classification.

use serde::{Deserialize, Serialize};

/// Lifecycle class a raw status belongs to.
///
/// Transitions: `Pending → InProgress → Succeeded | Failed`, or
/// `Pending → Succeeded | Failed` directly. `Succeeded` and `Failed` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    /// Accepted by the service, work not started yet.
    Pending,
    /// Work is running.
    InProgress,
    /// Resource is usable.
    Succeeded,
    /// Resource will not become usable without a new request.
    Failed,
}

impl StatusClass {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl std::fmt::Display for StatusClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Status values reported by the forecasting service's describe calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceStatus {
    Active,
    CreatePending,
    CreateInProgress,
    CreateFailed,
    CreateStopping,
    CreateStopped,
    UpdatePending,
    UpdateInProgress,
    UpdateFailed,
    DeletePending,
    DeleteInProgress,
    DeleteFailed,
    ActiveStopping,
    ActiveStopped,
    Failed,
}

impl ResourceStatus {
    pub const ALL: [ResourceStatus; 15] = [
        Self::Active,
        Self::CreatePending,
        Self::CreateInProgress,
        Self::CreateFailed,
        Self::CreateStopping,
        Self::CreateStopped,
        Self::UpdatePending,
        Self::UpdateInProgress,
        Self::UpdateFailed,
        Self::DeletePending,
        Self::DeleteInProgress,
        Self::DeleteFailed,
        Self::ActiveStopping,
        Self::ActiveStopped,
        Self::Failed,
    ];

    /// Parse the exact spelling the service uses. Unknown strings yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::CreatePending => "CREATE_PENDING",
            Self::CreateInProgress => "CREATE_IN_PROGRESS",
            Self::CreateFailed => "CREATE_FAILED",
            Self::CreateStopping => "CREATE_STOPPING",
            Self::CreateStopped => "CREATE_STOPPED",
            Self::UpdatePending => "UPDATE_PENDING",
            Self::UpdateInProgress => "UPDATE_IN_PROGRESS",
            Self::UpdateFailed => "UPDATE_FAILED",
            Self::DeletePending => "DELETE_PENDING",
            Self::DeleteInProgress => "DELETE_IN_PROGRESS",
            Self::DeleteFailed => "DELETE_FAILED",
            Self::ActiveStopping => "ACTIVE_STOPPING",
            Self::ActiveStopped => "ACTIVE_STOPPED",
            Self::Failed => "FAILED",
        }
    }

    /// Map a service status onto the lifecycle class.
    pub fn class(&self) -> StatusClass {
        match self {
            Self::CreatePending | Self::UpdatePending | Self::DeletePending => StatusClass::Pending,
            Self::CreateInProgress
            | Self::UpdateInProgress
            | Self::DeleteInProgress
            | Self::CreateStopping
            | Self::ActiveStopping => StatusClass::InProgress,
            // A stopped monitor is settled; a stopped create never became usable.
            Self::Active | Self::ActiveStopped => StatusClass::Succeeded,
            Self::CreateFailed
            | Self::CreateStopped
            | Self::UpdateFailed
            | Self::DeleteFailed
            | Self::Failed => StatusClass::Failed,
        }
    }
}

impl std::fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps raw status strings from some external API onto [`StatusClass`].
///
/// Returning `None` marks the string as outside the known vocabulary; the
/// orchestrator treats that as a protocol error.
pub trait StatusVocabulary: Send + Sync {
    fn classify(&self, raw: &str) -> Option<StatusClass>;
}

/// The forecasting service's vocabulary ([`ResourceStatus`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastVocabulary;

impl StatusVocabulary for ForecastVocabulary {
    fn classify(&self, raw: &str) -> Option<StatusClass> {
        ResourceStatus::parse(raw).map(|s| s.class())
    }
}
