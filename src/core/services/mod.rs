pub mod credential_resolver;
pub mod encryption_service;
pub mod error_classifier;
pub mod key_service;
pub mod operation_hooks;
pub mod sync_executor;
pub mod sync_service;
