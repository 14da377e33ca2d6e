//! Scenario-based tests for toolpipe

mod helpers;

mod chain_examples;
mod laws;
mod scheduling;
