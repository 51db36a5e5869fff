pub mod auth;
pub mod listening;
pub mod progress;
pub mod speaking;
pub mod users;
pub mod vocabulary;
