fn main() {
    if let Err(e) = qof_recall_lib::run() {
        tracing::error!(error = %e, "Startup failed");
        eprintln!("qof-recall: {e}");
        std::process::exit(1);
    }
}
