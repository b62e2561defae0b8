pub mod assembler;
pub mod cleanup;
pub mod history;
pub mod library;
pub mod pipeline;
pub mod scheduler;
pub mod themes;
pub mod topic;
pub mod voice;
