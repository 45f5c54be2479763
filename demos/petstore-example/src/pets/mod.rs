pub mod domain;
pub(crate) mod repository;
pub(crate) mod routes;
