pub mod answer;
pub mod catalog;
pub mod ids;
pub mod question;
pub mod score;
pub mod submission;

pub use answer::{resolve_answer, AnswerMap, AnswerRef, FlaggedSet, ResolvedOption};
pub use catalog::{Catalog, CatalogEntry, MockExam, SessionKind, SubjectGroup, TopicEntry};
pub use ids::QuestionId;
pub use question::{letter_position, option_letter, Question, QuestionOption, Topic};
pub use score::ScoreResult;
pub use submission::{SubmissionItem, SubmissionPayload};
