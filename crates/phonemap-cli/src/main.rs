use clap::Parser;
use phonemap_cli::cli::args::Cli;
use phonemap_cli::cli::commands::dispatch;
use phonemap_cli::exit_codes;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = phonemap_cli::logging::init(&cli.log) {
        eprintln!("fatal: {e:?}");
        std::process::exit(exit_codes::CONFIG_ERROR);
    }
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
