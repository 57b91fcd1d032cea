pub mod pool;
pub mod verification_store;
