//! Inbound adapters. HTTP is the only driving surface.

pub mod http;
