pub mod actions;
pub mod context;
pub mod core;
pub mod kb;
pub mod llm;
pub mod main_module;
pub mod security;
pub mod tickets;

#[cfg(test)]
pub mod tests;
