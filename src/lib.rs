pub mod gallery;
pub mod imagegen;
pub mod model;
pub mod prompts;
pub mod remote;
pub mod store;
pub mod tree;
