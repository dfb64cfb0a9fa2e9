//! Authentication flow

mod flow;

pub use flow::{AuthFlow, AuthStage};
