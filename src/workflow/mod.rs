pub mod exam_flow;
pub mod session;
pub mod timer;

pub use exam_flow::{ExamFlow, StartOutcome};
pub use session::{Phase, Session};
pub use timer::{format_elapsed, SessionTimer, TimerGuard};
