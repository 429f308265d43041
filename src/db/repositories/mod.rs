pub mod clips;
pub mod maintenance;
pub mod messages;
pub mod streams;
