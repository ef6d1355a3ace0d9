//! rTimeSync main entrypoint.

use rtimesync::run;
use rtimesync::ui::messages::error;

fn main() {
    println!();
    if let Err(e) = run() {
        error(format!("Error: {}", e));
        std::process::exit(1);
    }
}
