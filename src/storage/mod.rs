pub mod disk;
pub mod heap_file;
pub mod page;
pub mod tuple;
