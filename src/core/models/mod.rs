pub mod credential;
pub mod key_pair;
pub mod outcome;
pub mod sync_operation;
pub mod vcs_report;
