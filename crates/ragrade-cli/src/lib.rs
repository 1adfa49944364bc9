//! Terminal interface for ragrade

mod display;
mod ui;

pub use display::{
    format_exam_summary, format_grading_result, format_query_answer, print_exam_summary,
    print_grading_result, print_query_answer,
};
pub use ui::{display_banner, handle_input_with_history, is_exit_command, print_help};

// Re-export core types
pub use ragrade_core::{Error, Result};
