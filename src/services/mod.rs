// Services - per-resource orchestration between the HTTP layer and the moderation core

pub mod admin_service;
pub mod course_service;
pub mod post_service;
pub mod professor_service;

pub use admin_service::AdminService;
pub use course_service::CourseService;
pub use post_service::PostService;
pub use professor_service::ProfessorService;
