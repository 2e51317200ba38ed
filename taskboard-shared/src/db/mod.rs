/// PostgreSQL plumbing: the connection pool and the embedded schema
/// migrations. Row-level queries live next to their types in `models`.

pub mod migrations;
pub mod pool;
