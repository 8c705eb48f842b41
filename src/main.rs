use std::process::ExitCode;

fn main() -> ExitCode {
    vulnwatch::app::startup::run()
}
