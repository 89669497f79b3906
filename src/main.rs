fn main() {
    if let Err(err) = cropcheck::cli::run() {
        tracing::error!(error = ?err, "run failed");
        cropcheck::ui::eprintln_error(&err);
        std::process::exit(cropcheck::exit::exit_code(&err));
    }
}
