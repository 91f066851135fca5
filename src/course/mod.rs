pub mod assistant;
pub mod error;
pub mod extract;
pub mod stage;
pub mod validate;

pub use assistant::CourseAssistant;
pub use error::{ CourseError, ErrorKind, Operation };
pub use stage::{ determine_stage, Stage };
pub use validate::validate_course_structure;
