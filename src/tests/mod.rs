// Test suite for the light-client chain view

pub mod storage_tests;
pub mod cli_tests;
