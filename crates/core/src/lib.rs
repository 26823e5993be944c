pub mod detection;
pub mod shared;
pub mod worker;
