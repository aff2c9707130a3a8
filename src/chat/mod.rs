pub mod conversations;
pub mod ingress;
pub mod messages;
pub mod store;
