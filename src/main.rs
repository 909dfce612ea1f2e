//! ovc - A uniform front-end over native version-control tools

use omnivc::ui::output;

fn main() {
    let status = match omnivc::cli::run() {
        Ok(status) => status,
        Err(e) => {
            output::error(format!("{:#}", e));
            1
        }
    };
    std::process::exit(status);
}
