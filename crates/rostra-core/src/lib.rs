pub mod debate;
pub mod errors;
pub mod ids;
pub mod provider;
pub mod research;
pub mod summary;
pub mod turn;
pub mod verdict;
