pub mod bulletin;
pub mod grades;
pub mod roster;
