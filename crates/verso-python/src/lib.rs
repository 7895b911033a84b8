mod detection;
mod provider;
mod reshim;

pub use provider::PythonProvider;
