//! Services that keep side effects out of the request/response core

pub mod io;

pub use io::ImageIoService;
