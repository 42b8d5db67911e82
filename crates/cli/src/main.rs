use std::process::ExitCode;

fn main() -> ExitCode {
    ceiba_cli::run()
}
