use std::process::ExitCode;

fn main() -> ExitCode {
    cropnote::run()
}
