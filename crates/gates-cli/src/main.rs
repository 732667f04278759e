use std::process::ExitCode;

fn main() -> ExitCode {
    match metaspn_gates_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            metaspn_gates_cli::output::print_error(&err.to_string());
            ExitCode::FAILURE
        }
    }
}
