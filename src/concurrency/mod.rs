pub mod deadlock;
pub mod lock_manager;
pub mod transaction;

#[cfg(test)]
mod lock_manager_test;
