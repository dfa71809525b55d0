pub mod crypto;
pub mod hooks;
pub mod key_store;
pub mod prompt;
pub mod vcs;
