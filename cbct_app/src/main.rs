//! CBCT viewer app
//!
//! Launch from the directory holding `Test_data`, for example:
//! `cargo run --release -- --transform-source prompt`

use env_logger::{Env, Target};
use log::error;

mod args;
mod window;

use crate::{
    args::{config_from_args, get_command},
    window::MinifbWindow,
};

pub fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let args = get_command().get_matches();

    let config = match config_from_args(&args) {
        Ok(c) => c,
        Err(e) => {
            error!("{e}");
            std::process::exit(1);
        }
    };

    let stdin = std::io::stdin();
    let res = cbct_lib::run(&config, stdin.lock(), MinifbWindow::open);

    if let Err(e) = res {
        error!("{e}");
        std::process::exit(1);
    }
}
