pub mod autocomplete;
pub mod executor;
pub mod hits;
pub mod results;
