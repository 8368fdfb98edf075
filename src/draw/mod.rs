//! Draw & Scoring Engine: digit permutations and quarter-winner
//! computation.

mod digits;
mod engine;
mod error;

pub use digits::{Axis, Digits};
pub use engine::{DrawEngine, QuarterWinner};
pub use error::DrawError;
