#![forbid(unsafe_code)]

fn main() -> std::process::ExitCode {
    campus_checkin_cli::main_entry()
}
