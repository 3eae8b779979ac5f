//! The backend's agents, for naming the active-agent indicator.

/// Routing target for every call the client makes.
pub const COORDINATOR_AGENT_ID: &str = "69971296953ca8351f0efd31";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub purpose: &'static str,
}

pub const AGENTS: &[AgentInfo] = &[
    AgentInfo {
        id: COORDINATOR_AGENT_ID,
        name: "Support Coordinator Manager",
        purpose: "Routes queries, orchestrates sub-agents",
    },
    AgentInfo {
        id: "6997127ef908c28cb54245e0",
        name: "Knowledge Base Agent",
        purpose: "Searches KB for answers, web search fallback",
    },
    AgentInfo {
        id: "6997127f87d5b3967580ec38",
        name: "Ticket Creator Agent",
        purpose: "Creates support tickets",
    },
    AgentInfo {
        id: "699712802e1ca01aa7c6dfa2",
        name: "Email Notifier Agent",
        purpose: "Sends notification emails",
    },
];

pub fn lookup(id: &str) -> Option<&'static AgentInfo> {
    AGENTS.iter().find(|a| a.id == id)
}

/// Display name for an agent id, falling back to the id itself.
pub fn display_name(id: &str) -> &str {
    lookup(id).map(|a| a.name).unwrap_or(id)
}
