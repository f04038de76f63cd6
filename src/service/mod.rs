pub mod lifecycle;
pub mod roster;
