pub mod series;
pub mod status;
