//! End-to-end tests which run the full router against a real PostgreSQL database.
//! Run with `--features integration_test` and TEST_DB_URL pointing at a server you can create databases on.

mod task_flow;
mod test_util;
