#![deny(missing_docs)]

//! Core library for the Aerodesk support assistant.
//!
//! Aerodesk answers airline customer queries with a retrieval-augmented
//! pipeline (chunk, embed, search, generate) and escalates unresolved
//! conversations to the right internal department by email.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Vector index abstraction and the Qdrant-backed implementation.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion and escalation counters.
pub mod metrics;
/// Retrieval pipeline: chunking, extraction, ingestion, answer generation.
pub mod pipeline;
/// Language-model provider clients and the mail relay abstraction.
pub mod provider;
/// Conversation state, department routing, and the satisfaction protocol.
pub mod support;
