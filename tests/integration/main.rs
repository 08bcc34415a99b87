//! Integration tests

mod api_test;
mod config_test;
mod influx_test;
