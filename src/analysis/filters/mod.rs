pub mod diacritics;
pub mod lowercase;
pub mod stemmer;
