//! quill: in-memory blog service.
//!
//! Configured from the environment, optionally seeded from a `.env` file:
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `localhost` |
//! | `PORT` | `8080` |
//! | `LOG_LEVEL` | `info` |
//! | `READ_TIMEOUT` | `30s` |
//! | `WRITE_TIMEOUT` | `30s` |
//! | `SHUTDOWN_TIMEOUT` | `15s` |
//!
//! Try:
//!   curl -X POST http://localhost:8080/api/v1/blogs \
//!        -H 'content-type: application/json' \
//!        -d '{"title":"Hello","content":"First post","author":"ada"}'
//!   curl 'http://localhost:8080/api/v1/blogs?author=ada'

use std::process::ExitCode;
use std::sync::Arc;

use quill::server::shutdown_signal;
use quill::{Config, Error, MemoryBlogStore, Server, api, logger};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("quill: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), Error> {
    // A `.env` file in the working directory is optional; real variables win.
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => return Err(e.into()),
    }
    let config = Config::from_env()?;
    logger::init(config.log_level)?;

    let store = Arc::new(MemoryBlogStore::new());
    let app = api::app(store);

    Server::new(&config).serve(app, shutdown_signal()).await
}
