pub mod data_test;
pub mod schedule_test;
