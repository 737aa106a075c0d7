mod basic_tests;
mod lifecycle_tests;
