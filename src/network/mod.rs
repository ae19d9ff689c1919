pub mod directory;
pub mod pairs;
pub mod tree;
