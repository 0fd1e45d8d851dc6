pub mod map;
pub mod panels;
pub mod plot;
pub mod prediction;
pub mod summary;
pub mod timeseries;
