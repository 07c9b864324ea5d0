use std::process::ExitCode;

fn main() -> ExitCode {
    offerly_cli::run()
}
