pub mod dir_key_store;
