use agency_locator_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("agency-locator: {err}");
        std::process::exit(1);
    }
}
