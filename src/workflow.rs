//! GitHub Actions workflow commands.

/// Marks the step as failed with `message`. The exit status is up to the caller.
pub fn set_failed(message: &str) {
    println!("{}", error_command(message));
}

fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

fn escape_data(data: &str) -> String {
    data.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
