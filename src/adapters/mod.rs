pub mod crypto;
pub mod git;
pub mod key_stores;
pub mod prompt;
