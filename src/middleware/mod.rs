pub mod page_stats;
pub mod timing;
