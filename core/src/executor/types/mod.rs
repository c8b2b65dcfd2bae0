pub mod outcome;
pub mod report;
pub mod request;
pub mod unit;

pub use outcome::*;
pub use report::*;
pub use request::*;
pub use unit::*;
