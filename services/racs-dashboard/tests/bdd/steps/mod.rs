//! BDD step definitions for the RACS dashboard client

pub mod builder_steps;
pub mod dashboard_steps;
pub mod lifecycle_steps;
pub mod log_tail_steps;

/// Feature files write newlines as `\n`
pub fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

/// Parse a comma-separated list of offsets such as `"0,2,2"`
pub fn offsets(list: &str) -> Vec<u64> {
    list.split(',')
        .map(|o| o.trim().parse().expect("offset must be a number"))
        .collect()
}
