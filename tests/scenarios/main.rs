//! Scenario-based tests for guided-setup

mod helpers;

mod failure_handling;
mod quickstart;
mod serve;
