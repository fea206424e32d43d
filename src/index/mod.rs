pub mod entry;
pub mod inverted;
pub mod positional;
pub mod posting;
