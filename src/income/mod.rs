pub mod mentorship;
pub mod promotional;
pub mod summary;
