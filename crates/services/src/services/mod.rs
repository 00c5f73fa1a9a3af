pub mod analysis;
pub mod extract;
pub mod inference;
pub mod prompts;
