pub mod toml_loader;

pub use toml_loader::{load_all_parameters, load_parameters, parse_parameters, ParamsFile};
