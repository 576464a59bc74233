//! External delivery channels.

pub mod collab;
