pub mod ai;
pub mod cell;
pub mod clue;
pub mod collision;
pub mod entity;
pub mod grid;
pub mod rules;
