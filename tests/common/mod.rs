#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
use streamdb::{DbClient, DbConfig};

pub fn client() -> DbClient {
    streamdb::init_logging();
    DbClient::connect(&DbConfig::in_memory("integration")).expect("open in-memory store")
}

pub fn stream_start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2021, 1, 1)
        .unwrap()
        .and_hms_micro_opt(0, 0, 0, 0)
        .unwrap()
}

pub fn at(offset_secs: i64) -> NaiveDateTime {
    stream_start() + Duration::seconds(offset_secs)
}
