//! I/O: ENVI raster access, wavelength tables, report output

pub mod envi;
pub mod report;
pub mod wavelength_file;

pub use envi::{find_header, DataType, EnviHeader, Interleave, LineReader};
pub use report::write_report;
pub use wavelength_file::{load_wavelength_table, resolve_wavelength_grid};
