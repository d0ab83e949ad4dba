use clap::Parser;
use relayctl::CliOpts;

#[tokio::main(flavor = "current_thread")]
pub async fn main() -> anyhow::Result<()> {
    if let Err(e) = relayctl::run(CliOpts::parse()).await {
        println!("error: ");

        for err in e.chain() {
            println!("{err}");
        }

        println!("{}", e.backtrace());
        std::process::exit(1);
    }
    Ok(())
}
