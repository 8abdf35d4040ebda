mod batch;
mod cli;

use scrutin_bot::error::AppError;

pub fn run() -> Result<(), AppError> {
    cli::run()
}
