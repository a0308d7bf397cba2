//! End-to-end helpers: an in-process API server, a stand-in text model, and
//! an agent dashboard wired to them over HTTP.

pub mod harness;
