//! ntm-core: agent routing and effectiveness learning for tmux-hosted AI agents.
//!
//! Classifies what each agent pane is doing, scores agents for the next unit
//! of work, and learns from reported task outcomes which agent types handle
//! which kinds of task best. [`api::RoutingCore`] is the entry point.

pub mod activity;
pub mod agents;
pub mod api;
pub mod config;
pub mod context;
pub mod effectiveness;
pub mod ensemble;
pub mod routing;
pub mod tmux;
