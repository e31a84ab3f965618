pub mod quiz;
pub mod track;
