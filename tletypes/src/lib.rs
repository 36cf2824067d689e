extern crate nalgebra as na;

pub mod frame;
pub mod outcome;
pub mod position;
pub mod prelude;
pub mod record;
pub mod time;
