use std::process::ExitCode;

fn main() -> ExitCode {
    dyninclude_cli::run()
}
