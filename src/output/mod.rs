pub mod formatter;

pub use formatter::{
    format_file_result, format_found, format_header, format_summary, should_use_colors,
};
