pub mod buffer_pool;
pub mod lru_replacer;
pub mod replace;

#[cfg(test)]
mod lru_replacer_test;
