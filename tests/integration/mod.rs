mod cli_tests;
mod fixtures;
mod snapshot_flow_tests;
