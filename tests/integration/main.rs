//! Integration tests for the harvester
//!
//! Harvest runs are driven end-to-end against the scripted rendering
//! backend; browser discovery is exercised against wiremock servers.

mod discovery_tests;
mod harvest_tests;
