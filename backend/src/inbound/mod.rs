//! Inbound adapters that translate external requests into calls on the
//! `StudentUseCases` driving port, keeping framework details at the edge.

pub mod http;
