pub mod exam_client;
pub mod submit_routes;

pub use exam_client::ExamClient;
pub use submit_routes::{explicit_route, mock_exam_routes, practice_route, SubmitRoute};
