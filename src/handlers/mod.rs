pub mod pages;
pub mod stats;
