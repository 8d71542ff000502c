use std::process::ExitCode;

fn main() -> ExitCode {
    match epinet::run_with_args() {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
