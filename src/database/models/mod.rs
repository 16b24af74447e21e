pub mod category;
pub mod course;
pub mod enrollment;
pub mod user;
pub mod video;

pub use category::Category;
pub use course::{CatalogFilter, CatalogRow, CatalogSort, Course, CourseInput, CourseSummary, CourseTitle, EnrolledCourse};
pub use enrollment::Enrollment;
pub use user::{User, UserCredentials, UserSummary};
pub use video::{format_duration, Video, VideoInput, VideoSummary};
