pub mod classifier;
pub mod error;
pub mod html_tag;
pub mod lead;
pub mod portal;
pub mod report;
pub mod search_query;
