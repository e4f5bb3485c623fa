//! Pure views over a scored agent list.

use std::collections::HashSet;

use super::scorer::ScoredAgent;

/// Highest-scoring non-excluded agent; the first one wins ties
pub fn get_best_agent(agents: &[ScoredAgent]) -> Option<&ScoredAgent> {
    let mut best: Option<&ScoredAgent> = None;
    for agent in agents.iter().filter(|a| !a.excluded) {
        if best.is_none_or(|b| agent.score > b.score) {
            best = Some(agent);
        }
    }
    best
}

/// Non-excluded agents sorted by score descending (stable among equal scores)
pub fn get_available_agents(agents: &[ScoredAgent]) -> Vec<ScoredAgent> {
    let mut available: Vec<ScoredAgent> = agents.iter().filter(|a| !a.excluded).cloned().collect();
    available.sort_by(|a, b| b.score.total_cmp(&a.score));
    available
}

/// Agents whose type tag matches, ignoring case; empty tag keeps all
pub fn filter_by_type(agents: &[ScoredAgent], agent_type: &str) -> Vec<ScoredAgent> {
    if agent_type.is_empty() {
        return agents.to_vec();
    }
    agents
        .iter()
        .filter(|a| a.agent_type.tag().eq_ignore_ascii_case(agent_type))
        .cloned()
        .collect()
}

/// Agents on the given pane indices; empty list keeps all
pub fn filter_by_panes(agents: &[ScoredAgent], pane_indices: &[u32]) -> Vec<ScoredAgent> {
    if pane_indices.is_empty() {
        return agents.to_vec();
    }
    let wanted: HashSet<u32> = pane_indices.iter().copied().collect();
    agents
        .iter()
        .filter(|a| wanted.contains(&a.pane_index))
        .cloned()
        .collect()
}

/// Agents not on the given pane indices; empty list keeps all
pub fn exclude_panes(agents: &[ScoredAgent], pane_indices: &[u32]) -> Vec<ScoredAgent> {
    if pane_indices.is_empty() {
        return agents.to_vec();
    }
    let excluded: HashSet<u32> = pane_indices.iter().copied().collect();
    agents
        .iter()
        .filter(|a| !excluded.contains(&a.pane_index))
        .cloned()
        .collect()
}
