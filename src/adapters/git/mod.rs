pub mod git_repository;
pub mod ssh_keygen;
