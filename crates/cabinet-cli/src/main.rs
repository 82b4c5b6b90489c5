// Cabinet CLI Entry Point

use cabinet_cli::{output, router::CommandRouter};

fn main() {
    if let Err(e) = CommandRouter::route() {
        output::print_error(&e.user_message());
        tracing::debug!("{}", e.technical_details());
        std::process::exit(1);
    }
}
