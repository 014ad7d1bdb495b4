pub mod boulder;
pub mod speed_finals;
pub mod speed_qualification;
