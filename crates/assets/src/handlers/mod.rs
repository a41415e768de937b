mod code;
mod file;
mod java;
mod python;
mod r;
mod sas;
mod stata;

pub use code::{include_file, READ_ERROR};
pub use file::{FileHandler, ACCESS_ERROR, DEFAULT_HIDDEN};
pub use java::{parse_java_libraries, JavaHandler, JAVA_EXTENSIONS};
pub use python::{parse_python_libraries, PythonHandler, PYTHON_EXTENSIONS};
pub use r::{parse_r_libraries, RHandler, R_EXTENSIONS};
pub use sas::{parse_sas_libraries, SasHandler, SAS_EXTENSIONS};
pub use stata::{parse_stata_libraries, StataHandler, STATA_EXTENSIONS};
