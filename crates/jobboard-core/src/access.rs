//! Role-based access policy for client actions and routes.
//!
//! The policy is advisory: it decides what the client offers and which
//! requests it bothers to send. The server enforces roles and job
//! ownership on its own and its answer always wins.

use serde::{Deserialize, Serialize};

use crate::session::{Role, SessionState};

/// Actions the client can gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    BrowseJobs,
    ViewDashboard,
    ManageJob,
    ReviewApplicants,
    TransitionApplication,
    ApplyToJob,
    SaveJob,
    ViewMyApplications,
    ViewSavedJobs,
    ViewProfile,
}

/// Who may perform an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Requirement {
    Anyone,
    Authenticated,
    Staff,
    Seeker,
}

impl Action {
    pub const ALL: [Self; 10] = [
        Self::BrowseJobs,
        Self::ViewDashboard,
        Self::ManageJob,
        Self::ReviewApplicants,
        Self::TransitionApplication,
        Self::ApplyToJob,
        Self::SaveJob,
        Self::ViewMyApplications,
        Self::ViewSavedJobs,
        Self::ViewProfile,
    ];

    const fn requirement(self) -> Requirement {
        match self {
            Self::BrowseJobs => Requirement::Anyone,
            Self::ViewProfile => Requirement::Authenticated,
            Self::ViewDashboard
            | Self::ManageJob
            | Self::ReviewApplicants
            | Self::TransitionApplication => Requirement::Staff,
            Self::ApplyToJob | Self::SaveJob | Self::ViewMyApplications | Self::ViewSavedJobs => {
                Requirement::Seeker
            }
        }
    }
}

/// Outcome of gating an action or route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    Permit,
    /// No usable credential: send the user to authentication instead of
    /// rendering anything partial.
    RequireLogin,
    /// Signed in, but the role does not cover the action.
    Deny,
}

impl AccessDecision {
    pub const fn is_permit(self) -> bool {
        matches!(self, Self::Permit)
    }
}

/// Decide an action for a role.
pub const fn decide_for_role(role: Role, action: Action) -> AccessDecision {
    let requirement = action.requirement();
    if matches!(requirement, Requirement::Anyone) {
        return AccessDecision::Permit;
    }
    if matches!(role, Role::Anonymous) {
        return AccessDecision::RequireLogin;
    }
    let allowed = match requirement {
        Requirement::Anyone | Requirement::Authenticated => true,
        Requirement::Staff => role.is_staff(),
        Requirement::Seeker => matches!(role, Role::Seeker),
    };
    if allowed {
        AccessDecision::Permit
    } else {
        AccessDecision::Deny
    }
}

/// Decide an action for a session.
pub const fn decide(session: &SessionState, action: Action) -> AccessDecision {
    decide_for_role(session.role(), action)
}

/// Whether the session may perform the action.
pub const fn is_permitted(session: &SessionState, action: Action) -> bool {
    decide(session, action).is_permit()
}

/// Client routes and the action each one needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Jobs,
    JobDetail,
    ApplyJob,
    MyApplications,
    SavedJobs,
    Profile,
    EmployerDashboard,
    CreateJob,
    EditJob,
    JobApplicants,
    Login,
    Register,
}

impl Route {
    /// Action a route needs; `None` for public routes.
    pub const fn required_action(self) -> Option<Action> {
        match self {
            Self::Home | Self::Jobs | Self::JobDetail | Self::Login | Self::Register => None,
            Self::ApplyJob => Some(Action::ApplyToJob),
            Self::MyApplications => Some(Action::ViewMyApplications),
            Self::SavedJobs => Some(Action::ViewSavedJobs),
            Self::Profile => Some(Action::ViewProfile),
            Self::EmployerDashboard => Some(Action::ViewDashboard),
            Self::CreateJob | Self::EditJob => Some(Action::ManageJob),
            Self::JobApplicants => Some(Action::ReviewApplicants),
        }
    }
}

/// Gate a route for a session.
pub const fn gate_route(session: &SessionState, route: Route) -> AccessDecision {
    match route.required_action() {
        Some(action) => decide(session, action),
        None => AccessDecision::Permit,
    }
}
