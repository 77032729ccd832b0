pub mod analytics;
pub mod auth;
pub mod session;
pub mod swagger_main;
pub mod task;
pub mod user;
pub mod work_update;

#[cfg(test)]
pub mod test_util;
