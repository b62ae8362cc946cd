// Forum documents: posts with nested comments, courses with inline reviews,
// professors with standalone reviews.

pub mod course;
pub mod engagement;
pub mod post;
pub mod professor;

pub use course::{Course, CourseRatings, CourseReview, COURSE_RATING_RANGE};
pub use engagement::{Engageable, ModerationState, Report};
pub use post::{Comment, Post};
pub use professor::{Professor, ProfessorRatings, ProfessorReview, ProfessorScores};
