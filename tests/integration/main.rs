//! Integration tests for the TURF core, driven through the `Book`.

mod boundaries;
mod concurrency;
mod fixtures;
mod race_day;
