pub mod disk_manager;

#[cfg(test)]
mod disk_manager_test;
