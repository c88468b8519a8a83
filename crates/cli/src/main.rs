use std::process::ExitCode;

fn main() -> ExitCode {
    pvquote_cli::run()
}
