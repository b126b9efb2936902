//! Celebration overlay for the terminal: a timed burst of balloons,
//! confetti, golden stars and party poppers drawn over the host screen,
//! with a completion callback once the show is over.

pub mod celebration;
pub mod config;
pub mod effects;
