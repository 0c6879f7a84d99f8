//! Thin transport adapters (spec §6, component H — specified as a contract
//! only): each connects a transport to the agent loop, routing the final
//! reply back. Transports own their own timeouts, reconnection, and
//! identity filtering; none of that is part of the core.

pub mod discord;
pub mod repl;
pub mod telegram;
