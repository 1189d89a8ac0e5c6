pub mod kv_entry;
pub mod snapshot_date;
