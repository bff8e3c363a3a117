pub mod comment;
pub mod credits;
pub mod feedback;
pub mod ranking;
pub mod timestamp;
pub mod vote;

pub use comment::*;
pub use credits::*;
pub use feedback::*;
pub use ranking::*;
pub use vote::*;
