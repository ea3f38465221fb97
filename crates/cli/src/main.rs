fn main() -> std::process::ExitCode {
    reviewdesk_cli::run()
}
