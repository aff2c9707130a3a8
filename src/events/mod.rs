pub mod crud;
pub mod geo;
pub mod participation;
