use webdl_core::logging;

mod cli;

#[tokio::main]
async fn main() {
    // Log to the XDG state dir; fall back to stderr if that's unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    if let Err(err) = cli::run().await {
        eprintln!("webdl error: {:#}", err);
        std::process::exit(1);
    }
}
