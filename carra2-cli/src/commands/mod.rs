pub mod fetch;
pub mod periods;
