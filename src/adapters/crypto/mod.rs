pub mod age_engine;
