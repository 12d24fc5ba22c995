pub mod limits;
pub mod params;
pub mod volume;
