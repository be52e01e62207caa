pub mod angles;
pub mod driver;
pub mod smooth;
pub mod state;

pub use driver::RigDriver;
pub use smooth::{AngleFilter, BoundedStepFilter, EmaFilter};
pub use state::SmoothingState;
