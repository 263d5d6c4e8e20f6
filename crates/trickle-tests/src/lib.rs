//! Scenario and property test suite for Trickle.
//!
//! Drives the engine end to end the way a host chain would: positions are
//! opened and modified, blocks advance time, and owners claim.

pub mod helpers;
