pub mod entries;
pub mod init;
pub mod keys;
pub mod sync;
