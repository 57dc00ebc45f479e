//! Integration tests exercising the wired simulator end to end.

mod helpers;

mod behavior_test;
mod compute_test;
mod identity_test;
mod plugin_test;
