pub mod boulder;
pub mod finals;
pub mod qualification;
