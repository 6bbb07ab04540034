//! The four detection algorithms. Each is a pure function over its inputs; none of them
//! perform I/O or return `Result` — a non-match is simply `None` / an empty `Vec`, per §7.

pub mod auth_burst;
pub mod auth_chain;
pub mod keytab_smuggling;
pub mod privilege_escalation;
