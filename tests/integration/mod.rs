//! Integration tests for the choicepoint generator engine

mod archive_roundtrip;
mod config_integration;
mod exhaustive_search;
mod replay;
mod test_utils;
mod trainer_isolation;
