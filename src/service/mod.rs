//! Service: generic CRUD over one named collection, bound to its schema through a Model.

mod crud;
mod model;
pub use crud::Service;
pub use model::Model;
